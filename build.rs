use std::env;

fn main() {
    // Load .env during build so deployment settings can be embedded into the binary.
    if let Err(e) = dotenvy::dotenv() {
        println!(
            "cargo:warning=BUILD.RS: No .env file loaded ({}), using system environment variables.",
            e
        );
    }

    // Embed the interview API base URL at compile time. Runtime environment
    // variables still take precedence (see config::robust_env_var).
    if let Ok(base_url) = env::var("API_BASE_URL") {
        println!("cargo:rustc-env=API_BASE_URL={}", base_url);
        println!("cargo:warning=Embedded API_BASE_URL ({})", base_url);
    }

    tauri_build::build()
}
