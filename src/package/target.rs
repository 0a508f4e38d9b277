use std::path::PathBuf;

use super::merge::MergeSpec;

/// Flash mode handed to the merge tool when the board doesn't specify one
pub const DEFAULT_FLASH_MODE: &str = "dio";
/// Flash size handed to the merge tool when the board doesn't specify one
pub const DEFAULT_FLASH_SIZE: &str = "4MB";

const UF2_EXTENSION: &str = ".uf2";
const BIN_EXTENSION: &str = ".bin";

/// Flash parameters from the board definition
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FlashSettings {
    pub mode: String,
    pub size: String,
}

impl Default for FlashSettings {
    fn default() -> FlashSettings {
        FlashSettings {
            mode: DEFAULT_FLASH_MODE.to_string(),
            size: DEFAULT_FLASH_SIZE.to_string(),
        }
    }
}

/// How the linked program is turned into release artifacts
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Packaging {
    /// UF2 container, flashed through the RP2040 mass storage bootloader
    ContainerImage,
    /// Raw binary, merged into a factory image when `factory` is set
    RawBinary { factory: Option<MergeSpec> },
}

impl Packaging {
    /// Picks the packaging for the target called `name` built for `mcu`
    ///
    /// RP2040 family targets (or, without an MCU id, targets with `pico` in their name) produce
    /// UF2 containers. ESP32 family targets additionally get a factory image.
    pub fn detect(name: &str, mcu: &str, flash: &FlashSettings) -> Packaging {
        let mcu = mcu.trim().to_ascii_lowercase();

        if mcu.starts_with("rp2") || (mcu.is_empty() && name.contains("pico")) {
            Packaging::ContainerImage
        } else if mcu.starts_with("esp32") {
            Packaging::RawBinary {
                factory: Some(MergeSpec::for_chip(&mcu, flash)),
            }
        } else {
            Packaging::RawBinary { factory: None }
        }
    }

    /// The file extension of the linked program, including the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Packaging::ContainerImage => UF2_EXTENSION,
            Packaging::RawBinary { .. } => BIN_EXTENSION,
        }
    }

    pub fn factory(&self) -> Option<&MergeSpec> {
        match self {
            Packaging::RawBinary { factory } => factory.as_ref(),
            Packaging::ContainerImage => None,
        }
    }
}

/// A single build target as described by the build system
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildTarget {
    /// Name of the build environment, e.g. `esp32dev`
    pub name: String,
    /// Directory the linker writes the program to
    pub build_dir: PathBuf,
    /// Base name of the linked program, without extension
    pub program_name: String,
    pub packaging: Packaging,
}

impl BuildTarget {
    pub fn new<N, B, P>(
        name: N,
        mcu: &str,
        build_dir: B,
        program_name: P,
        flash: &FlashSettings,
    ) -> Self
    where
        N: Into<String>,
        P: Into<String>,
        B: Into<PathBuf>,
    {
        let name = name.into();
        let packaging = Packaging::detect(&name, mcu, flash);

        BuildTarget {
            name,
            build_dir: build_dir.into(),
            program_name: program_name.into(),
            packaging,
        }
    }

    /// Path of the linked program inside the build directory
    pub fn program_path(&self) -> PathBuf {
        self.build_dir.join(format!(
            "{}{}",
            self.program_name,
            self.packaging.extension()
        ))
    }
}
