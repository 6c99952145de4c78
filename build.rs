fn main() {
    println!("cargo::rustc-check-cfg=cfg(jetson_cuda)");
    println!("cargo:rerun-if-changed=build.rs");

    let target = std::env::var("TARGET").unwrap_or_default();

    if !target.contains("aarch64-unknown-linux") {
        println!("cargo:warning=Building without the CUDA runtime (not on Jetson)");
        return;
    }

    // The kernel binary is loaded at runtime, so nothing is compiled or linked here.
    // cudarc resolves the driver library dynamically.
    println!("cargo:rustc-cfg=jetson_cuda");
}
