fn main() {
    let stamp = chrono::Utc::now().format("%Y-%m-%d %H:%M UTC");
    println!("cargo:rustc-env=BUILD_TIMESTAMP={stamp}");
    println!("cargo:rerun-if-changed=build.rs");
}
