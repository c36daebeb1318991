fn main() {
    // Wifi credentials live in a local .env file, never in source.
    println!("cargo:rerun-if-changed=.env");
    println!("cargo:rerun-if-env-changed=WIFI_NETWORKS");
    if let Ok(vars) = dotenvy::dotenv_iter() {
        for (key, value) in vars.flatten() {
            println!("cargo:rustc-env={key}={value}");
        }
    }
}
