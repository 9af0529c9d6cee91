use std::env;
use std::fs;
use std::path::{Path, PathBuf};

// bun-webkit version from oven-sh/WebKit releases
const BUN_WEBKIT_VERSION: &str = "aaf3f80b1cc701b412f8abfb7c7f413644a229ff";

// Shared library name used by the `system-jsc` feature
const DEFAULT_SYSTEM_LIB: &str = "javascriptcoregtk-4.1";

fn main() {
    println!("cargo:rustc-check-cfg=cfg(jscore_static_webkit)");

    println!("cargo:rerun-if-env-changed=BUN_WEBKIT_VERSION");
    println!("cargo:rerun-if-env-changed=JSCORE_LIB_DIR");
    println!("cargo:rerun-if-env-changed=JSCORE_SYSTEM_LIB");
    println!("cargo:rerun-if-changed=build.rs");

    let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap();
    let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap();

    if target_os == "macos" || target_os == "ios" {
        configure_apple();
        return;
    }

    if let Ok(dir) = env::var("JSCORE_LIB_DIR") {
        link_static_webkit(Path::new(&dir), &target_os);
        return;
    }

    if env::var_os("CARGO_FEATURE_SYSTEM_JSC").is_some() {
        configure_system(&target_os);
        return;
    }

    match target_os.as_str() {
        "linux" => configure_bun_webkit("linux", &target_arch),
        "windows" => configure_bun_webkit("windows", &target_arch),
        _ => panic!("Unsupported OS for JavaScriptCore: {}", target_os),
    }
}

fn configure_apple() {
    // Apple platforms ship JavaScriptCore as a system framework
    println!("cargo:rustc-link-lib=framework=JavaScriptCore");

    if let Ok(sdk_path) = std::process::Command::new("xcrun")
        .args(["--show-sdk-path"])
        .output()
    {
        let sdk_path = String::from_utf8_lossy(&sdk_path.stdout);
        let sdk_path = sdk_path.trim();
        if !sdk_path.is_empty() {
            println!(
                "cargo:rustc-link-search=framework={}/System/Library/Frameworks",
                sdk_path
            );
        }
    }
}

fn configure_system(target_os: &str) {
    if target_os != "linux" {
        panic!("The system-jsc feature is only supported on Linux");
    }

    let lib = env::var("JSCORE_SYSTEM_LIB").unwrap_or_else(|_| DEFAULT_SYSTEM_LIB.to_string());
    println!("cargo:rustc-link-lib=dylib={}", lib);
}

fn configure_bun_webkit(os: &str, target_arch: &str) {
    let arch = match (os, target_arch) {
        ("linux", "x86_64") | ("windows", "x86_64") => "amd64",
        ("linux", "aarch64") => "arm64",
        _ => panic!(
            "Unsupported architecture for {} bun-webkit: {}",
            os, target_arch
        ),
    };

    let webkit_path = download_bun_webkit(os, arch);
    link_static_webkit(&webkit_path, os);
}

fn download_bun_webkit(os: &str, arch: &str) -> PathBuf {
    let version = env::var("BUN_WEBKIT_VERSION").unwrap_or_else(|_| BUN_WEBKIT_VERSION.to_string());

    let webkit_dir = get_cache_dir()
        .join(&version)
        .join(format!("{}-{}", os, arch));

    let marker = webkit_dir.join(".downloaded");
    if marker.exists() {
        return webkit_dir;
    }

    let artifact_name = format!("bun-webkit-{}-{}.tar.gz", os, arch);
    let url = format!(
        "https://github.com/oven-sh/WebKit/releases/download/autobuild-{}/{}",
        version, artifact_name
    );

    println!("cargo:warning=Downloading bun-webkit from {}", url);

    fs::create_dir_all(&webkit_dir).expect("Failed to create cache directory");

    // Stream straight into the decoder so the archive never sits in memory
    let response = ureq::get(&url)
        .call()
        .unwrap_or_else(|e| panic!("Failed to download bun-webkit: {}. URL: {}", e, url));
    let reader = response.into_body().into_reader();
    let tar_gz = flate2::read::GzDecoder::new(reader);
    let mut archive = tar::Archive::new(tar_gz);

    archive
        .unpack(&webkit_dir)
        .expect("Failed to extract bun-webkit archive");

    fs::write(&marker, "").expect("Failed to create marker file");

    webkit_dir
}

fn link_static_webkit(webkit_path: &Path, os: &str) {
    let lib_dir = find_lib_dir(webkit_path);

    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=static=JavaScriptCore");
    println!("cargo:rustc-link-lib=static=WTF");

    // bmalloc is folded into WTF on some Windows builds
    if lib_exists(&lib_dir, "bmalloc") {
        println!("cargo:rustc-link-lib=static=bmalloc");
    }

    // Windows builds ship ICU as "sicu*"
    if lib_exists(&lib_dir, "icudata") {
        println!("cargo:rustc-link-lib=static=icudata");
        println!("cargo:rustc-link-lib=static=icui18n");
        println!("cargo:rustc-link-lib=static=icuuc");
    } else if lib_exists(&lib_dir, "sicudt") {
        println!("cargo:rustc-link-lib=static=sicudt");
        println!("cargo:rustc-link-lib=static=sicuin");
        println!("cargo:rustc-link-lib=static=sicuuc");
    } else {
        println!(
            "cargo:warning=ICU libraries not found in {}",
            lib_dir.display()
        );
    }

    match os {
        "linux" => {
            for lib in ["stdc++", "atomic", "dl", "pthread", "m"] {
                println!("cargo:rustc-link-lib={}", lib);
            }
        }
        "windows" => {
            for lib in [
                "winmm", "bcrypt", "ntdll", "userenv", "dbghelp", "crypt32", "wsock32", "ws2_32",
                "advapi32", "ole32", "oleaut32", "uuid", "shell32",
            ] {
                println!("cargo:rustc-link-lib={}", lib);
            }
            println!("cargo:rustc-link-arg=/NODEFAULTLIB:libcmt");
            println!("cargo:rustc-link-lib=msvcrt");
        }
        _ => {}
    }

    // The static WebKit build expects the embedder to provide WTFTimer
    println!("cargo:rustc-cfg=jscore_static_webkit");

    let include_dir = webkit_path.join("include");
    if include_dir.exists() {
        println!("cargo:include={}", include_dir.display());
    }
}

fn find_lib_dir(webkit_path: &Path) -> PathBuf {
    let direct_lib = webkit_path.join("lib");
    if direct_lib.exists() {
        return direct_lib;
    }

    // Archives usually unpack into a single top-level directory
    if let Ok(entries) = fs::read_dir(webkit_path) {
        for entry in entries.flatten() {
            let lib_in_subdir = entry.path().join("lib");
            if lib_in_subdir.exists() {
                return lib_in_subdir;
            }
        }
    }

    webkit_path.to_path_buf()
}

fn lib_exists(lib_dir: &Path, lib_name: &str) -> bool {
    let Ok(entries) = fs::read_dir(lib_dir) else {
        return false;
    };
    let lib_prefix = format!("lib{}", lib_name);
    entries.flatten().any(|entry| {
        entry
            .file_name()
            .to_str()
            .map(|name| {
                (name.starts_with(lib_name) || name.starts_with(&lib_prefix))
                    && (name.ends_with(".lib") || name.ends_with(".a"))
            })
            .unwrap_or(false)
    })
}

fn get_cache_dir() -> PathBuf {
    if let Ok(cargo_home) = env::var("CARGO_HOME") {
        return PathBuf::from(cargo_home).join("cache").join("bun-webkit");
    }

    for var in ["HOME", "USERPROFILE"] {
        if let Ok(home) = env::var(var) {
            return PathBuf::from(home)
                .join(".cargo")
                .join("cache")
                .join("bun-webkit");
        }
    }

    PathBuf::from(env::var("OUT_DIR").unwrap()).join("bun-webkit-cache")
}
