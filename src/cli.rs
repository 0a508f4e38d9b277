use std::path::PathBuf;

use hyperk::{BuildEnv, Defines};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Print the version build flag and program name
    Version,
    /// Embed the web assets into a generated header
    Embed,
    /// Copy the linked program to the release directory and build factory images
    Package,
}

#[derive(StructOpt, Debug)]
pub struct Opts {
    #[structopt(subcommand)]
    pub command: Command,

    /// The project root directory
    #[structopt(
        env = "PROJECT_DIR",
        short = "C",
        long = "project-dir",
        default_value = ".",
        global = true
    )]
    pub project_dir: PathBuf,
    /// Directory the header is generated in [default: <project-dir>/include]
    #[structopt(env = "PROJECT_INCLUDE_DIR", long = "include-dir", global = true)]
    pub include_dir: Option<PathBuf>,
    /// Directory containing the web assets [default: <project-dir>/data]
    #[structopt(env = "HYPERK_DATA_DIR", long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
    /// Directory release artifacts are written to [default: <project-dir>/release]
    #[structopt(env = "HYPERK_RELEASE_DIR", long = "release-dir", global = true)]
    pub release_dir: Option<PathBuf>,
    /// Directory the linker wrote the program to
    #[structopt(env = "BUILD_DIR", long = "build-dir", global = true)]
    pub build_dir: Option<PathBuf>,
    /// Name of the build target
    #[structopt(env = "PIOENV", long = "target", global = true)]
    pub target: Option<String>,
    /// MCU id of the board
    #[structopt(env = "BOARD_MCU", long = "mcu", global = true)]
    pub mcu: Option<String>,
    /// Base name of the linked program [default: firmware]
    #[structopt(env = "PROGNAME", long = "progname", global = true)]
    pub program_name: Option<String>,
    /// The preprocessor defines of the build
    #[structopt(
        env = "CPPDEFINES",
        long = "defines",
        parse(from_str = Defines::parse),
        global = true
    )]
    pub defines: Option<Defines>,
    /// Flash mode of the factory image [default: dio]
    #[structopt(env = "BOARD_FLASH_MODE", long = "flash-mode", global = true)]
    pub flash_mode: Option<String>,
    /// Flash size of the factory image [default: 4MB]
    #[structopt(env = "BOARD_FLASH_SIZE", long = "flash-size", global = true)]
    pub flash_size: Option<String>,
    /// Command used to run esptool [default: esptool.py]
    #[structopt(env = "ESPTOOL", long = "esptool", global = true)]
    pub esptool: Option<String>,
}

impl Opts {
    /// Collects the options into the environment every stage reads from
    pub fn build_env(&self) -> BuildEnv {
        let mut builder = BuildEnv::builder();
        builder.project_dir(&self.project_dir);

        if let Some(dir) = &self.include_dir {
            builder.include_dir(dir);
        }
        if let Some(dir) = &self.data_dir {
            builder.data_dir(dir);
        }
        if let Some(dir) = &self.release_dir {
            builder.release_dir(dir);
        }
        if let Some(dir) = &self.build_dir {
            builder.build_dir(dir);
        }
        if let Some(target) = &self.target {
            builder.target(target);
        }
        if let Some(mcu) = &self.mcu {
            builder.mcu(mcu);
        }
        if let Some(name) = &self.program_name {
            builder.program_name(name);
        }
        if let Some(defines) = &self.defines {
            builder.defines(defines.clone());
        }
        if let Some(mode) = &self.flash_mode {
            builder.flash_mode(mode);
        }
        if let Some(size) = &self.flash_size {
            builder.flash_size(size);
        }
        if let Some(esptool) = &self.esptool {
            builder.esptool(esptool);
        }

        builder.build()
    }
}
