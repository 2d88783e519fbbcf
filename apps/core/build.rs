fn main() {
    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    if target_os != "windows" {
        return;
    }

    let icon_path = "../assets/vscrecent.ico";
    println!("cargo:rerun-if-changed={icon_path}");
    if !std::path::Path::new(icon_path).exists() {
        println!(
            "cargo:warning=vscrecent-core: Windows icon missing at {icon_path}; continuing without embedded icon"
        );
        return;
    }

    let mut res = winres::WindowsResource::new();
    res.set_icon(icon_path);
    res.compile().expect("failed to compile Windows resources");
}
