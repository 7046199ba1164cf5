use std::fs;

fn main() {
    let config_path = "app.config.json";
    println!("cargo:rerun-if-changed={}", config_path);

    let config_str = fs::read_to_string(config_path).unwrap_or_else(|_| {
        panic!(
            "\n\nBUILD ERROR: app.config.json not found at {}\n\
             The console must be built from the repository root.\n\n",
            config_path
        )
    });

    let config: serde_json::Value = serde_json::from_str(&config_str).unwrap_or_else(|e| {
        panic!("\n\nBUILD ERROR: Invalid app.config.json: {}\n\n", e)
    });

    let app = config.get("app").expect("app.config.json missing 'app' section");
    let storage = config.get("storage").expect("app.config.json missing 'storage' section");
    let server = config.get("server").expect("app.config.json missing 'server' section");

    let app_name = app.get("name").and_then(|v| v.as_str())
        .expect("app.config.json: app.name is required");
    let app_slug = app.get("slug").and_then(|v| v.as_str())
        .expect("app.config.json: app.slug is required");
    let profile_file = storage.get("profileFileName").and_then(|v| v.as_str())
        .expect("app.config.json: storage.profileFileName is required");
    let api_root = server.get("apiRoot").and_then(|v| v.as_str())
        .expect("app.config.json: server.apiRoot is required");

    println!("cargo:rustc-env=WHISPER_APP_NAME={}", app_name);
    println!("cargo:rustc-env=WHISPER_APP_SLUG={}", app_slug);
    println!("cargo:rustc-env=WHISPER_PROFILE_FILE={}", profile_file);
    println!("cargo:rustc-env=WHISPER_DEFAULT_API_ROOT={}", api_root);
}
