#![no_main]
use glucose_core::PipelineCfg;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse errors and validation errors are fine; panics are not.
    let parsed = toml::from_str::<glucose_config::Config>(data);
    assert_eq!(parsed.is_ok(), glucose_config::load_toml(data).is_ok());
    let Ok(cfg) = parsed else {
        return;
    };
    if cfg.validate().is_ok() {
        // Every validated config must convert into runtime structs
        let _ = PipelineCfg::from(&cfg);
    }
});
