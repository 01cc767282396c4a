// build.rs

fn main() {
    // --- Link against X11 ---
    // Prefer pkg-config, which knows where the distribution put libX11.
    // If pkg-config fails (not installed, or the .pc file is missing),
    // fall back to naming the library directly and searching standard paths.

    match pkg_config::probe_library("x11") {
        Ok(lib) => {
            eprintln!(
                "pkg-config found x11 {}. Linking configured automatically.",
                lib.version
            );
        }
        Err(err) => {
            eprintln!(
                "pkg-config failed for library 'x11' ({}). Falling back to manual linking.",
                err
            );
            println!("cargo:rustc-link-lib=X11");
            println!("cargo:rustc-link-search=/usr/lib");
            // println!("cargo:rustc-link-search=/usr/lib64");
            // println!("cargo:rustc-link-search=/usr/local/lib");
            eprintln!("Manual linking flags applied. Ensure the X11 development library is installed.");
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
}
