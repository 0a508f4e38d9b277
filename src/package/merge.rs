//! Factory image assembly through `esptool.py merge_bin`

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::Command;

use log::debug;

use super::target::FlashSettings;

/// Offset of the second stage bootloader on the original ESP32
pub const ESP32_BOOTLOADER_OFFSET: u32 = 0x1000;
/// Offset of the second stage bootloader on every newer ESP32 variant
pub const BOOTLOADER_OFFSET: u32 = 0x0;
pub const PARTITION_TABLE_OFFSET: u32 = 0x8000;
pub const APPLICATION_OFFSET: u32 = 0x10000;

/// File name of the bootloader image in the build directory
pub const BOOTLOADER_FILE: &str = "bootloader.bin";
/// File name of the partition table image in the build directory
pub const PARTITIONS_FILE: &str = "partitions.bin";

/// Layout and flash parameters of a factory image
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct MergeSpec {
    pub chip_id: String,
    pub bootloader_offset: u32,
    pub partition_table_offset: u32,
    pub application_offset: u32,
    pub flash_mode: String,
    pub flash_size: String,
}

impl MergeSpec {
    pub fn for_chip(chip_id: &str, flash: &FlashSettings) -> MergeSpec {
        MergeSpec {
            chip_id: chip_id.to_string(),
            bootloader_offset: bootloader_offset(chip_id),
            partition_table_offset: PARTITION_TABLE_OFFSET,
            application_offset: APPLICATION_OFFSET,
            flash_mode: flash.mode.clone(),
            flash_size: flash.size.clone(),
        }
    }

    /// Builds the `merge_bin` argument list writing the image to `output`
    pub fn args(
        &self,
        output: &Path,
        bootloader: &Path,
        partitions: &Path,
        application: &Path,
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "--chip".into(),
            self.chip_id.as_str().into(),
            "merge_bin".into(),
            "-o".into(),
            output.into(),
            "--flash_mode".into(),
            self.flash_mode.as_str().into(),
            "--flash_size".into(),
            self.flash_size.as_str().into(),
        ];

        let components = [
            (self.bootloader_offset, bootloader),
            (self.partition_table_offset, partitions),
            (self.application_offset, application),
        ];

        for (offset, path) in components.iter() {
            args.push(format!("{:#x}", offset).into());
            args.push(path.into());
        }

        args
    }
}

/// Bootloader load offset for `chip_id`
pub fn bootloader_offset(chip_id: &str) -> u32 {
    if chip_id == "esp32" {
        ESP32_BOOTLOADER_OFFSET
    } else {
        BOOTLOADER_OFFSET
    }
}

/// Why a merge didn't produce an image
#[derive(Debug)]
pub enum MergeFailure {
    /// The tool couldn't be started
    Launch(io::Error),
    /// The tool ran and exited with a failure status; `None` when killed by a signal
    Exit(Option<i32>),
}

/// Something that can assemble a factory image from a `merge_bin` argument list
pub trait ImageMerger {
    fn merge(&self, args: &[OsString]) -> Result<(), MergeFailure>;
}

/// Runs `esptool.py` as a child process and waits for it to finish
#[derive(Debug, Clone)]
pub struct Esptool {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl Esptool {
    /// Parses a command line like `esptool.py` or `python3 -m esptool`
    ///
    /// Returns `None` for a blank command line.
    pub fn from_command_line(command_line: &str) -> Option<Esptool> {
        let mut words = command_line.split_whitespace().map(OsString::from);
        let program = words.next()?;

        Some(Esptool {
            program,
            leading_args: words.collect(),
        })
    }
}

impl ImageMerger for Esptool {
    fn merge(&self, args: &[OsString]) -> Result<(), MergeFailure> {
        debug!(
            "Running {:?} {:?} {:?}",
            self.program, self.leading_args, args
        );

        let status = Command::new(&self.program)
            .args(&self.leading_args)
            .args(args)
            .status()
            .map_err(MergeFailure::Launch)?;

        if status.success() {
            Ok(())
        } else {
            Err(MergeFailure::Exit(status.code()))
        }
    }
}
