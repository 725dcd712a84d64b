//! Language runtimes and JavaScript package managers.

use localtools_core::installable::{
    EnsureSymlink, binary_install, tar_package_install, zipped_binary_install,
    zipped_package_install,
};
use localtools_core::{BoxedInstallable, InstallableExt};
use localtools_schema::{DownloadSpec, EnvAction, MultiPlatform, TarCompression};

/// Deno, unpacked straight into `bin/`.
pub fn deno(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |triple: &str| {
        DownloadSpec::new(
            format!("https://github.com/denoland/deno/releases/download/v{version}/deno-{triple}.zip"),
            format!("deno-v{version}-{triple}.zip"),
        )
    };

    MultiPlatform::new(
        spec("x86_64-unknown-linux-gnu"),
        spec("x86_64-apple-darwin"),
    )
    .with_darwin_aarch64(spec("aarch64-apple-darwin"))
    .map(|s| {
        zipped_binary_install(s)
            .with_env(|dir| {
                vec![
                    EnvAction::set_path_variable("DENO_INSTALL", dir),
                    EnvAction::set_path_variable("DENO_INSTALL_ROOT", dir),
                ]
            })
            .boxed()
    })
}

fn node_variant(version: &str, arch: &str, compression: TarCompression) -> BoxedInstallable {
    let dir = format!("node-v{version}-{arch}");
    let ext = match compression {
        TarCompression::Gzip => "gz",
        TarCompression::Xz => "xz",
    };
    let file = format!("{dir}.tar.{ext}");
    let spec = DownloadSpec::new(format!("https://nodejs.org/dist/v{version}/{file}"), file);

    tar_package_install(spec, compression, None)
        .with_env(move |target| vec![EnvAction::add_to_path(target.join(&dir).join("bin"))])
        .boxed()
}

/// Node.js. The Linux build ships as `.tar.xz`, macOS builds as `.tar.gz`.
pub fn nodejs(version: &str) -> MultiPlatform<BoxedInstallable> {
    MultiPlatform::new(
        node_variant(version, "linux-x64", TarCompression::Xz),
        node_variant(version, "darwin-x64", TarCompression::Gzip),
    )
    .with_darwin_aarch64(node_variant(version, "darwin-arm64", TarCompression::Gzip))
}

/// pnpm standalone executable.
pub fn pnpm(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |asset: &str, key: &str| {
        DownloadSpec::new(
            format!("https://github.com/pnpm/pnpm/releases/download/v{version}/pnpm-{asset}"),
            format!("pnpm-{key}.{version}"),
        )
    };

    MultiPlatform::new(
        spec("linux-x64", "linux-x64"),
        spec("macos-x64", "darwin-x64"),
    )
    .with_darwin_aarch64(spec("macos-arm64", "darwin-arm64"))
    .map(|s| {
        binary_install(s, "pnpm")
            .with_env(|dir| {
                let home = dir.join("pnpm").join("bin");
                vec![
                    EnvAction::add_to_path(home.clone()),
                    EnvAction::set_path_variable("PNPM_HOME", &home),
                ]
            })
            .boxed()
    })
}

/// Eclipse Temurin (formerly `AdoptOpenJDK`) builds, e.g. version `17.0.7+7`.
pub fn adoptopenjdk(version: &str) -> MultiPlatform<BoxedInstallable> {
    let major = version.split('.').next().unwrap_or(version);
    let underscored = version.replace('+', "_");
    let spec = |os: &str| {
        let file = format!("OpenJDK{major}U-jdk_x64_{os}_hotspot_{underscored}.tar.gz");
        DownloadSpec::new(
            format!(
                "https://github.com/adoptium/temurin{major}-binaries/releases/download/jdk-{version}/{file}"
            ),
            file,
        )
    };

    let jdk = format!("jdk-{version}");
    // The macOS archive nests the JDK under Contents/Home.
    let mac_home = format!("jdk-{version}/Contents/Home");

    MultiPlatform::new(jdk_variant(spec("linux"), jdk), jdk_variant(spec("mac"), mac_home))
}

fn jdk_variant(spec: DownloadSpec, home: String) -> BoxedInstallable {
    tar_package_install(spec, TarCompression::Gzip, None)
        .with_env(move |dir| {
            let java_home = dir.join(&home);
            vec![
                EnvAction::set_path_variable("JAVA_HOME", &java_home),
                EnvAction::add_to_path(java_home.join("bin")),
            ]
        })
        .boxed()
}

/// Yarn classic. Platform independent.
pub fn yarn(version: &str) -> BoxedInstallable {
    let spec = DownloadSpec::new(
        format!("https://github.com/yarnpkg/yarn/releases/download/v{version}/yarn-v{version}.tar.gz"),
        format!("yarn-v{version}.tar.gz"),
    );
    let bin = format!("yarn-v{version}/bin");
    tar_package_install(spec, TarCompression::Gzip, None)
        .with_env(move |dir| vec![EnvAction::add_to_path(dir.join(&bin))])
        .boxed()
}

/// Bun, unpacked under the target and linked into `bin/`.
pub fn bun(version: &str) -> MultiPlatform<BoxedInstallable> {
    let variant = |arch: &str| {
        let spec = DownloadSpec::new(
            format!("https://github.com/oven-sh/bun/releases/download/bun-v{version}/bun-{arch}.zip"),
            format!("bun-{version}-{arch}.zip"),
        );
        zipped_package_install(spec, None)
            .with_post_install(EnsureSymlink::new("bin/bun", format!("bun-{arch}/bun")))
            .boxed()
    };

    MultiPlatform::new(variant("linux-x64"), variant("darwin-x64"))
        .with_darwin_aarch64(variant("darwin-aarch64"))
}
