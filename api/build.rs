fn main() {
    println!(
        "cargo:rustc-env=STATIC_BUILD_DATE={}",
        chrono::Utc::now().format("%Y-%m-%d")
    );
}
