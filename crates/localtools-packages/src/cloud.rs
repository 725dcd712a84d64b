//! Cloud and infrastructure command-line tools.

use localtools_core::installable::{
    EnsureSymlink, binary_install, pkg_package_install, tar_package_install,
    zipped_binary_install, zipped_package_install,
};
use localtools_core::{BoxedInstallable, InstallableExt};
use localtools_schema::{DownloadSpec, EnvAction, MultiPlatform, TarCompression};

/// Terraform, unzipped into `bin/`.
pub fn terraform(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |os: &str| {
        let file = format!("terraform_{version}_{os}_amd64.zip");
        DownloadSpec::new(
            format!("https://releases.hashicorp.com/terraform/{version}/{file}"),
            file,
        )
    };

    MultiPlatform::new(spec("linux"), spec("darwin")).map(|s| zipped_binary_install(s).boxed())
}

/// ADL compiler binary distribution.
pub fn adl(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |os: &str| {
        let file = format!("adl-bindist-{version}-{os}.zip");
        DownloadSpec::new(
            format!("https://github.com/adl-lang/adl/releases/download/v{version}/{file}"),
            file,
        )
    };

    MultiPlatform::new(spec("linux-x64"), spec("macos-x64"))
        .with_darwin_aarch64(spec("macos-arm64"))
        .map(|s| zipped_package_install(s, None).boxed())
}

/// AWS CLI v2. Linux ships a zip, macOS an installer package; both end up
/// under `lib/` with `aws` and `aws_completer` linked into `bin/`.
pub fn awscli(version: &str) -> MultiPlatform<BoxedInstallable> {
    let linux_file = format!("awscli-exe-linux-x86_64-{version}.zip");
    let linux = zipped_package_install(
        DownloadSpec::new(format!("https://awscli.amazonaws.com/{linux_file}"), linux_file),
        Some("lib"),
    )
    .with_post_install(EnsureSymlink::new("bin/aws", "lib/aws/dist/aws"))
    .with_post_install(EnsureSymlink::new(
        "bin/aws_completer",
        "lib/aws/dist/aws_completer",
    ))
    .boxed();

    let mac_file = format!("AWSCLIV2-{version}.pkg");
    let mac = pkg_package_install(
        DownloadSpec::new(format!("https://awscli.amazonaws.com/{mac_file}"), mac_file),
        Some("lib"),
    )
    .with_post_install(EnsureSymlink::new("bin/aws", "lib/aws-cli/aws"))
    .with_post_install(EnsureSymlink::new(
        "bin/aws_completer",
        "lib/aws-cli/aws_completer",
    ))
    .boxed();

    MultiPlatform::new(linux, mac)
}

/// aws-vault (`ByteNess` fork) raw executables.
pub fn aws_vault(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |asset: &str| {
        DownloadSpec::new(
            format!("https://github.com/ByteNess/aws-vault/releases/download/v{version}/aws-vault-{asset}"),
            format!("aws-vault-{asset}-ByteNess{version}"),
        )
    };

    MultiPlatform::new(spec("linux-amd64"), spec("darwin-amd64"))
        .with_darwin_aarch64(spec("darwin-arm64"))
        .map(|s| binary_install(s, "aws-vault").boxed())
}

/// Google Cloud CLI, unpacked into `google-cloud-sdk/`.
pub fn gcloud(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |os: &str| {
        let file = format!("google-cloud-cli-{version}-{os}.tar.gz");
        DownloadSpec::new(
            format!("https://storage.googleapis.com/cloud-sdk-release/{file}"),
            file,
        )
    };

    MultiPlatform::new(spec("linux-x86_64"), spec("darwin-x86_64"))
        .with_darwin_aarch64(spec("darwin-arm"))
        .map(|s| {
            tar_package_install(s, TarCompression::Gzip, None)
                .with_env(|dir| vec![EnvAction::add_to_path(dir.join("google-cloud-sdk/bin"))])
                .boxed()
        })
}

/// Foundry (forge, cast, anvil) unpacked into `bin/`.
pub fn foundry(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |os: &str| {
        DownloadSpec::new(
            format!(
                "https://github.com/foundry-rs/foundry/releases/download/{version}/foundry_nightly_{os}_amd64.tar.gz"
            ),
            format!("foundry_{version}_{os}_amd64.tar.gz"),
        )
    };

    MultiPlatform::new(spec("linux"), spec("darwin"))
        .map(|s| tar_package_install(s, TarCompression::Gzip, Some("bin")).boxed())
}

/// Pulumi, unpacked into `pulumi/`.
pub fn pulumi(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |os: &str| {
        let file = format!("pulumi-v{version}-{os}.tar.gz");
        DownloadSpec::new(
            format!("https://get.pulumi.com/releases/sdk/{file}"),
            file,
        )
    };

    MultiPlatform::new(spec("linux-x64"), spec("darwin-x64"))
        .with_darwin_aarch64(spec("darwin-arm64"))
        .map(|s| {
            tar_package_install(s, TarCompression::Gzip, None)
                .with_env(|dir| vec![EnvAction::add_to_path(dir.join("pulumi"))])
                .boxed()
        })
}
