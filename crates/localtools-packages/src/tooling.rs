//! Build tools, task runners and git hooks.

use localtools_core::installable::{
    EnsureSymlink, binary_install, deno_install, script_install, tar_package_install,
    zipped_package_install,
};
use localtools_core::{BoxedInstallable, InstallableExt};
use localtools_schema::{DownloadSpec, EnvAction, MultiPlatform, TarCompression};

/// Bazel via its self-extracting installer script, linked into `bin/`.
pub fn bazel(version: &str) -> MultiPlatform<BoxedInstallable> {
    let variant = |os: &str| {
        let file = format!("bazel-{version}-installer-{os}-x86_64.sh");
        let spec = DownloadSpec::new(
            format!("https://github.com/bazelbuild/bazel/releases/download/{version}/{file}"),
            file,
        );
        let prefix = format!("bazel-{version}");
        script_install(spec, &prefix)
            .with_post_install(EnsureSymlink::new("bin/bazel", format!("{prefix}/bin/bazel")))
            .boxed()
    };

    MultiPlatform::new(variant("linux"), variant("darwin"))
}

/// Gradle binary distribution. Platform independent.
pub fn gradle(version: &str) -> BoxedInstallable {
    let spec = DownloadSpec::new(
        format!("https://services.gradle.org/distributions/gradle-{version}-bin.zip"),
        format!("gradle-{version}-bin.zip"),
    );
    let bin = format!("gradle-{version}/bin");
    zipped_package_install(spec, None)
        .with_env(move |dir| vec![EnvAction::add_to_path(dir.join(&bin))])
        .boxed()
}

/// Task (taskfile.dev), scoped to `taskfile/`.
pub fn taskfile(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |asset: &str| {
        DownloadSpec::new(
            format!("https://github.com/go-task/task/releases/download/v{version}/task_{asset}.tar.gz"),
            format!("task_v{version}_{asset}.tar.gz"),
        )
    };

    MultiPlatform::new(spec("linux_386"), spec("darwin_amd64")).map(|s| {
        tar_package_install(s, TarCompression::Gzip, Some("taskfile"))
            .with_env(|dir| vec![EnvAction::add_to_path(dir.join("taskfile"))])
            .boxed()
    })
}

/// act (run GitHub Actions locally). The archive's README and LICENSE are
/// kept beside the binary in `act/`.
pub fn act(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |asset: &str| {
        DownloadSpec::new(
            format!("https://github.com/nektos/act/releases/download/v{version}/act_{asset}.tar.gz"),
            format!("act_{version}_{asset}.tar.gz"),
        )
    };

    MultiPlatform::new(spec("Linux_x86_64"), spec("Darwin_x86_64"))
        .with_darwin_aarch64(spec("Darwin_arm64"))
        .map(|s| {
            tar_package_install(s, TarCompression::Gzip, Some("act"))
                .with_env(|dir| vec![EnvAction::add_to_path(dir.join("act"))])
                .boxed()
        })
}

/// lefthook raw executables.
pub fn lefthook(version: &str) -> MultiPlatform<BoxedInstallable> {
    let spec = |asset: &str, key: &str| {
        DownloadSpec::new(
            format!(
                "https://github.com/evilmartians/lefthook/releases/download/v{version}/lefthook_{version}_{asset}"
            ),
            format!("lefthook-bindist-{key}-{version}"),
        )
    };

    MultiPlatform::new(
        spec("Linux_x86_64", "linux_x86_64"),
        spec("MacOS_x86_64", "darwin_x86_64"),
    )
    .with_darwin_aarch64(spec("MacOS_arm64", "darwin_aarch64"))
    .map(|s| binary_install(s, "lefthook").boxed())
}

/// dnit, installed with `deno install`. Needs deno on PATH.
pub fn dnit(version: &str) -> BoxedInstallable {
    deno_install(
        "dnit",
        format!("https://deno.land/x/dnit@dnit-v{version}/main.ts"),
    )
    .boxed()
}
