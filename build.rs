use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=BLPAPI_ROOT");
    println!("cargo:rerun-if-env-changed=BLPAPI_LIBDIR");

    // Python's lib directory, so the embedded interpreter used by the test
    // binaries links. PyO3's build script handles the rest.
    if let Ok(output) = Command::new("python3")
        .args([
            "-c",
            "import sysconfig; print(sysconfig.get_config_var('LIBDIR'))",
        ])
        .output()
    {
        if output.status.success() {
            let libdir = String::from_utf8_lossy(&output.stdout);
            let libdir = libdir.trim();
            if !libdir.is_empty() && libdir != "None" {
                println!("cargo:rustc-link-search=native={libdir}");
            }
        }
    }

    if env::var_os("CARGO_FEATURE_NATIVE").is_some() {
        link_blpapi();
    }
}

/// Link the native blpapi3 library: `BLPAPI_LIBDIR` if set, otherwise the
/// platform directory under `BLPAPI_ROOT`.
fn link_blpapi() {
    let libdir = env::var("BLPAPI_LIBDIR").ok().or_else(|| {
        let root = env::var("BLPAPI_ROOT").unwrap_or_else(|_| ".".to_owned());
        let platform = match env::var("CARGO_CFG_TARGET_OS").as_deref() {
            Ok("linux") => "Linux",
            Ok("macos") => "Darwin",
            _ => "lib",
        };
        Some(format!("{root}/{platform}"))
    });
    if let Some(libdir) = libdir {
        println!("cargo:rustc-link-search=native={libdir}");
    }

    let name = match env::var("CARGO_CFG_TARGET_POINTER_WIDTH").as_deref() {
        Ok("64") => "blpapi3_64",
        _ => "blpapi3_32",
    };
    println!("cargo:rustc-link-lib=dylib={name}");
}
