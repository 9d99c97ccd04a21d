//! Parse and validate every WGSL source the renderer compiles.

use cosmic_backdrop::shaders;

fn validate(name: &str, source: &str) {
    let module = naga::front::wgsl::parse_str(source).unwrap_or_else(|e| panic!("{name}: parse error:\n{}", e.emit_to_string(source)));
    naga::valid::Validator::new(naga::valid::ValidationFlags::all(), naga::valid::Capabilities::all())
        .validate(&module)
        .unwrap_or_else(|e| panic!("{name}: validation error: {e:?}"));
}

fn has_entry(source: &str, name: &str) -> bool {
    let module = naga::front::wgsl::parse_str(source).unwrap();
    module.entry_points.iter().any(|ep| ep.name == name)
}

#[test]
fn test_point_shader_is_valid() {
    validate("point", shaders::POINT_SHADER);
    assert!(has_entry(shaders::POINT_SHADER, "vs_main"));
    assert!(has_entry(shaders::POINT_SHADER, "fs_main"));
}

#[test]
fn test_bloom_shaders_are_valid() {
    for (name, source) in [
        ("bloom extract", shaders::bloom_extract_shader()),
        ("bloom blur", shaders::bloom_blur_shader()),
        ("bloom composite", shaders::bloom_composite_shader()),
    ] {
        validate(name, &source);
        assert!(has_entry(&source, "vs_main"), "{name}");
        assert!(has_entry(&source, "fs_main"), "{name}");
    }
}
