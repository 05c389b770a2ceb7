use std::env;
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn main() {
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("constants.gen.rs");
    let mut f = File::create(dest_path).unwrap();

    let target = env::var("TARGET").unwrap();
    let mut target_bits = target.split('-');
    let arch = target_bits.next().unwrap_or("unknown");
    target_bits.next();
    let platform = target_bits.next().unwrap_or("unknown");

    #[allow(unused_mut)]
    let mut rustc_version: Option<String> = None;
    #[allow(unused_mut)]
    let mut rustc_channel: Option<&str> = None;

    #[cfg(feature = "rust-info")]
    {
        use rustc_version::{version, version_meta, Channel};

        rustc_version = version().ok().map(|v| v.to_string());
        rustc_channel = version_meta().ok().map(|meta| match meta.channel {
            Channel::Dev => "dev",
            Channel::Nightly => "nightly",
            Channel::Beta => "beta",
            Channel::Stable => "stable",
        });
    }

    writeln!(f, "/// The rustc version that was used to compile this crate").ok();
    match rustc_version {
        Some(version) => writeln!(
            f,
            "#[allow(dead_code)] pub const RUSTC_VERSION: Option<&str> = Some(\"{}\");",
            version
        ),
        None => writeln!(
            f,
            "#[allow(dead_code)] pub const RUSTC_VERSION: Option<&str> = None;"
        ),
    }
    .ok();

    writeln!(f, "/// The release channel of the compiler").ok();
    match rustc_channel {
        Some(channel) => writeln!(
            f,
            "#[allow(dead_code)] pub const RUSTC_CHANNEL: Option<&str> = Some(\"{}\");",
            channel
        ),
        None => writeln!(
            f,
            "#[allow(dead_code)] pub const RUSTC_CHANNEL: Option<&str> = None;"
        ),
    }
    .ok();

    writeln!(f, "/// The platform identifier").ok();
    writeln!(
        f,
        "#[allow(dead_code)] pub const PLATFORM: &str = \"{}\";",
        platform
    )
    .ok();
    writeln!(f, "/// The CPU architecture identifier").ok();
    writeln!(f, "#[allow(dead_code)] pub const ARCH: &str = \"{}\";", arch).ok();

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
}
