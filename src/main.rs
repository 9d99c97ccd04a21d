use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cosmic_backdrop::{BackdropConfig, HostOptions};

#[derive(Parser, Debug)]
#[command(name = "cosmic-backdrop", version)]
struct Cli {
    /// JSON config file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of pattern particles.
    #[arg(long)]
    particles: Option<usize>,

    /// Number of background stars.
    #[arg(long)]
    stars: Option<usize>,

    /// Fixed seed for a reproducible pattern sequence.
    #[arg(long)]
    seed: Option<u64>,

    /// Transition progress added per frame.
    #[arg(long)]
    speed: Option<f32>,

    /// Minimum gap between pointer-driven pattern switches.
    #[arg(long, default_value_t = 150)]
    trigger_interval_ms: u64,

    /// Switch pattern on this period without any input.
    #[arg(long)]
    auto_advance_secs: Option<f32>,
}

impl Cli {
    fn backdrop_config(&self) -> anyhow::Result<BackdropConfig> {
        let mut config = match &self.config {
            Some(path) => BackdropConfig::from_json_file(path)
                .with_context(|| format!("load config '{}'", path.display()))?,
            None => BackdropConfig::default(),
        };
        if let Some(n) = self.particles {
            config = config.with_particle_count(n);
        }
        if let Some(n) = self.stars {
            config = config.with_star_count(n);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(speed) = self.speed {
            config = config.with_transition_speed(speed);
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn host_options(&self) -> anyhow::Result<HostOptions> {
        let auto_advance = match self.auto_advance_secs {
            Some(secs) => Some(
                Duration::try_from_secs_f32(secs)
                    .with_context(|| format!("invalid --auto-advance-secs {secs}"))?,
            ),
            None => None,
        };
        Ok(HostOptions {
            trigger_interval: Duration::from_millis(self.trigger_interval_ms),
            auto_advance,
            ..HostOptions::default()
        })
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = cli.backdrop_config()?;
    let options = cli.host_options()?;

    cosmic_backdrop::run(config, options).context("backdrop exited with an error")
}
