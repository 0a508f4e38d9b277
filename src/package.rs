//! Post-link release packaging
//!
//! Copies the linked program into the release directory under a versioned name and, for ESP32
//! family targets, assembles a factory image containing bootloader, partition table and
//! application. Copy problems are logged and reported but never fail the build; a failing
//! factory merge does.

pub mod merge;
pub mod target;

use std::fs;
use std::path::{Path, PathBuf};

use log::{error, info, warn};
use sha2::{Digest, Sha256};

pub use merge::{Esptool, ImageMerger, MergeFailure, MergeSpec};
pub use target::{BuildTarget, FlashSettings, Packaging};

use crate::version::{Version, PRODUCT_PREFIX};
use crate::Error;

/// Name of the release directory inside the project root
pub const RELEASE_DIR: &str = "release";

/// Version used in release names when the build carries no version define
pub const FALLBACK_VERSION: &str = "unknown";

const FACTORY_SUFFIX: &str = "_factory_flash.bin";

/// A file written to the release directory
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Artifact {
    pub path: PathBuf,
    /// Lowercase hex SHA-256 of the file contents
    pub sha256: String,
}

impl Artifact {
    fn new(path: PathBuf, contents: &[u8]) -> Artifact {
        Artifact {
            path,
            sha256: format!("{:x}", Sha256::digest(contents)),
        }
    }
}

/// What happened to the linked program
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ReleaseCopy {
    Copied(Artifact),
    /// The program wasn't found at the given path
    NotFound(PathBuf),
    /// The program exists but couldn't be copied
    Failed(PathBuf),
}

/// What happened to the factory image
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FactoryImage {
    /// The target doesn't use factory images
    NotApplicable,
    /// The bootloader or partition table wasn't found in the build directory
    MissingComponents,
    Merged(Artifact),
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct PackageReport {
    pub release: ReleaseCopy,
    pub factory: FactoryImage,
}

/// File name of the release copy, e.g. `Hyperk_2.3.1_esp32dev.bin`
pub fn release_name(version: &Version, target: &BuildTarget) -> String {
    format!(
        "{}_{}_{}{}",
        PRODUCT_PREFIX,
        version.sanitized(),
        target.name,
        target.packaging.extension()
    )
}

/// File name of the factory image, e.g. `Hyperk_2.3.1_esp32dev_factory_flash.bin`
pub fn factory_name(version: &Version, target: &BuildTarget) -> String {
    format!(
        "{}_{}_{}{}",
        PRODUCT_PREFIX,
        version.sanitized(),
        target.name,
        FACTORY_SUFFIX
    )
}

/// Packages the linked program of `target` into `release_dir`
///
/// Returns an error only when a factory image merge was attempted and failed.
pub fn package<M: ImageMerger + ?Sized>(
    target: &BuildTarget,
    version: &Version,
    release_dir: &Path,
    merger: &M,
) -> Result<PackageReport, Error> {
    if let Err(err) = fs::create_dir_all(release_dir) {
        error!(
            ">>> [ERROR] Could not create release directory {}: {}",
            release_dir.display(),
            err
        );
    }

    let release = copy_program(target, version, release_dir);
    let factory = match target.packaging.factory() {
        Some(spec) => merge_factory_image(target, version, release_dir, spec, merger)?,
        None => FactoryImage::NotApplicable,
    };

    Ok(PackageReport { release, factory })
}

fn copy_program(target: &BuildTarget, version: &Version, release_dir: &Path) -> ReleaseCopy {
    let source = target.program_path();

    if !source.is_file() {
        error!(">>> [ERROR] File not found: {}", source.display());

        return ReleaseCopy::NotFound(source);
    }

    let dest = release_dir.join(release_name(version, target));
    let file_name = source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!(">>> [COPY] {} -> {}", file_name, dest.display());

    let copied = fs::read(&source).and_then(|contents| {
        fs::write(&dest, &contents)?;
        Ok(contents)
    });

    match copied {
        Ok(contents) => {
            let artifact = Artifact::new(dest, &contents);

            info!(
                ">>> [SUCCESS] {} (sha256 {})",
                artifact.path.display(),
                artifact.sha256
            );

            ReleaseCopy::Copied(artifact)
        }
        Err(err) => {
            error!(
                ">>> [ERROR] Could not copy {} to {}: {}",
                source.display(),
                dest.display(),
                err
            );

            ReleaseCopy::Failed(source)
        }
    }
}

fn merge_factory_image<M: ImageMerger + ?Sized>(
    target: &BuildTarget,
    version: &Version,
    release_dir: &Path,
    spec: &MergeSpec,
    merger: &M,
) -> Result<FactoryImage, Error> {
    let bootloader = target.build_dir.join(merge::BOOTLOADER_FILE);
    let partitions = target.build_dir.join(merge::PARTITIONS_FILE);

    for component in [&bootloader, &partitions].iter() {
        if !component.is_file() {
            warn!(
                "Skipping factory image for {}: {} not found",
                target.name,
                component.display()
            );

            return Ok(FactoryImage::MissingComponents);
        }
    }

    let output = release_dir.join(factory_name(version, target));
    let args = spec.args(&output, &bootloader, &partitions, &target.program_path());

    info!(
        ">>> [MERGE] {} (chip {}, bootloader at {:#x})",
        output.display(),
        spec.chip_id,
        spec.bootloader_offset
    );

    if let Err(failure) = merger.merge(&args) {
        let err = match failure {
            MergeFailure::Launch(err) => Error::MergeLaunch(target.name.clone(), err),
            MergeFailure::Exit(code) => Error::MergeFailed(target.name.clone(), code),
        };

        error!(">>> [ERROR] Factory image for {} failed: {}", target.name, err);

        return Err(err);
    }

    let contents = fs::read(&output).map_err(Error::io(&output))?;
    let artifact = Artifact::new(output, &contents);

    info!(
        ">>> [SUCCESS] {} (sha256 {})",
        artifact.path.display(),
        artifact.sha256
    );

    Ok(FactoryImage::Merged(artifact))
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::ffi::OsString;

    use super::*;

    /// Records every invocation and writes the output file like `merge_bin` would
    #[derive(Default)]
    struct RecordingMerger {
        calls: RefCell<Vec<Vec<String>>>,
    }

    impl ImageMerger for RecordingMerger {
        fn merge(&self, args: &[OsString]) -> Result<(), MergeFailure> {
            let args: Vec<String> = args
                .iter()
                .map(|arg| arg.to_string_lossy().into_owned())
                .collect();
            let output = args[4].clone();

            self.calls.borrow_mut().push(args);
            fs::write(output, b"factory").map_err(MergeFailure::Launch)
        }
    }

    struct FailingMerger;

    impl ImageMerger for FailingMerger {
        fn merge(&self, _args: &[OsString]) -> Result<(), MergeFailure> {
            Err(MergeFailure::Exit(Some(2)))
        }
    }

    struct Fixture {
        dir: tempfile::TempDir,
        target: BuildTarget,
    }

    impl Fixture {
        fn new(name: &str, mcu: &str) -> Fixture {
            let dir = tempfile::tempdir().unwrap();
            let build_dir = dir.path().join(".pio").join("build").join(name);
            fs::create_dir_all(&build_dir).unwrap();

            let target = BuildTarget::new(
                name,
                mcu,
                build_dir,
                "Hyperk_2.3.1",
                &FlashSettings::default(),
            );

            Fixture { dir, target }
        }

        fn build_file(&self, name: &str, contents: &[u8]) {
            fs::write(self.target.build_dir.join(name), contents).unwrap();
        }

        fn link_program(&self) {
            fs::write(self.target.program_path(), b"app").unwrap();
        }

        fn release_dir(&self) -> PathBuf {
            self.dir.path().join(RELEASE_DIR)
        }
    }

    #[test]
    fn it_should_name_release_artifacts() {
        let fixture = Fixture::new("esp32dev", "esp32");
        let version = Version::new("2.3.1");

        assert_eq!(
            release_name(&version, &fixture.target),
            "Hyperk_2.3.1_esp32dev.bin"
        );
        assert_eq!(
            factory_name(&version, &fixture.target),
            "Hyperk_2.3.1_esp32dev_factory_flash.bin"
        );
    }

    #[test]
    fn it_should_sanitize_version_in_names() {
        let fixture = Fixture::new("pico", "rp2040");

        assert_eq!(
            release_name(&Version::new("2.3.1 (dev)"), &fixture.target),
            "Hyperk_2.3.1dev_pico.uf2"
        );
    }

    #[test]
    fn it_should_copy_program_into_release_dir() {
        let fixture = Fixture::new("d1_mini", "esp8266");
        fixture.link_program();

        let merger = RecordingMerger::default();
        let report = package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &merger,
        )
        .unwrap();

        let dest = fixture.release_dir().join("Hyperk_2.3.1_d1_mini.bin");
        assert_eq!(fs::read(&dest).unwrap(), b"app");
        assert_eq!(
            report.release,
            ReleaseCopy::Copied(Artifact {
                path: dest,
                sha256: "a172cedcae47474b615c54d510a5d84a8dea3032e958587430b413538be3f333"
                    .to_string(),
            })
        );
        assert_eq!(report.factory, FactoryImage::NotApplicable);
        assert!(merger.calls.borrow().is_empty());
    }

    #[test]
    fn it_should_copy_uf2_for_container_targets() {
        let fixture = Fixture::new("pico", "rp2040");
        fixture.link_program();

        let report = package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &FailingMerger,
        )
        .unwrap();

        assert!(fixture
            .release_dir()
            .join("Hyperk_2.3.1_pico.uf2")
            .is_file());
        assert_eq!(report.factory, FactoryImage::NotApplicable);
    }

    #[test]
    fn it_should_not_fail_when_program_is_missing() {
        let fixture = Fixture::new("d1_mini", "esp8266");

        let report = package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &FailingMerger,
        )
        .unwrap();

        assert_eq!(
            report.release,
            ReleaseCopy::NotFound(fixture.target.program_path())
        );
        assert!(fixture.release_dir().is_dir());
    }

    #[test]
    fn it_should_merge_factory_image_for_esp32() {
        let fixture = Fixture::new("esp32dev", "esp32");
        fixture.link_program();
        fixture.build_file(merge::BOOTLOADER_FILE, b"boot");
        fixture.build_file(merge::PARTITIONS_FILE, b"part");

        let merger = RecordingMerger::default();
        let report = package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &merger,
        )
        .unwrap();

        let output = fixture
            .release_dir()
            .join("Hyperk_2.3.1_esp32dev_factory_flash.bin");
        let build_dir = &fixture.target.build_dir;
        let calls = merger.calls.borrow();

        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            vec![
                "--chip".to_string(),
                "esp32".to_string(),
                "merge_bin".to_string(),
                "-o".to_string(),
                output.to_string_lossy().into_owned(),
                "--flash_mode".to_string(),
                "dio".to_string(),
                "--flash_size".to_string(),
                "4MB".to_string(),
                "0x1000".to_string(),
                build_dir.join("bootloader.bin").to_string_lossy().into_owned(),
                "0x8000".to_string(),
                build_dir.join("partitions.bin").to_string_lossy().into_owned(),
                "0x10000".to_string(),
                build_dir.join("Hyperk_2.3.1.bin").to_string_lossy().into_owned(),
            ]
        );
        assert_eq!(
            report.factory,
            FactoryImage::Merged(Artifact {
                path: output,
                sha256: "06c8aaa93d80a768829b6005973fa92e34612849b79910c8be8e3b006cf91c61"
                    .to_string(),
            })
        );
    }

    #[test]
    fn it_should_use_zero_bootloader_offset_for_newer_chips() {
        let fixture = Fixture::new("esp32-s3", "esp32s3");
        fixture.link_program();
        fixture.build_file(merge::BOOTLOADER_FILE, b"boot");
        fixture.build_file(merge::PARTITIONS_FILE, b"part");

        let merger = RecordingMerger::default();
        package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &merger,
        )
        .unwrap();

        let calls = merger.calls.borrow();
        assert_eq!(calls[0][1], "esp32s3");
        assert_eq!(calls[0][9], "0x0");
        assert_eq!(calls[0][11], "0x8000");
        assert_eq!(calls[0][13], "0x10000");
    }

    #[test]
    fn it_should_skip_merge_without_companion_binaries() {
        let fixture = Fixture::new("esp32dev", "esp32");
        fixture.link_program();
        fixture.build_file(merge::BOOTLOADER_FILE, b"boot");

        let merger = RecordingMerger::default();
        let report = package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &merger,
        )
        .unwrap();

        assert_eq!(report.factory, FactoryImage::MissingComponents);
        assert!(matches!(report.release, ReleaseCopy::Copied(_)));
        assert!(merger.calls.borrow().is_empty());
    }

    #[test]
    fn it_should_fail_the_build_when_merge_fails() {
        let fixture = Fixture::new("esp32dev", "esp32");
        fixture.link_program();
        fixture.build_file(merge::BOOTLOADER_FILE, b"boot");
        fixture.build_file(merge::PARTITIONS_FILE, b"part");

        let err = package(
            &fixture.target,
            &Version::new("2.3.1"),
            &fixture.release_dir(),
            &FailingMerger,
        )
        .unwrap_err();

        match &err {
            Error::MergeFailed(target, code) => {
                assert_eq!(target, "esp32dev");
                assert_eq!(*code, Some(2));
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("esp32dev"));
    }
}
