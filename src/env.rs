//! The build environment as handed over by the build system
//!
//! Every stage reads its paths, target description and version from one [`BuildEnv`], built
//! once per invocation. Defaults for anything the build system didn't provide are resolved when
//! the environment is built, version fallbacks when a stage asks for its version.

use std::path::{Path, PathBuf};

use crate::defines::Defines;
use crate::package::{self, BuildTarget, Esptool, FlashSettings};
use crate::version::{self, Version};
use crate::Error;

/// Program name used when the build system doesn't provide one
pub const DEFAULT_PROGRAM_NAME: &str = "firmware";

/// Command used to run esptool when none is configured
pub const DEFAULT_ESPTOOL: &str = "esptool.py";

const DATA_DIR: &str = "data";
const INCLUDE_DIR: &str = "include";

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct BuildEnv {
    project_dir: PathBuf,
    include_dir: PathBuf,
    data_dir: PathBuf,
    release_dir: PathBuf,
    build_dir: Option<PathBuf>,
    target: Option<String>,
    mcu: String,
    program_name: String,
    defines: Defines,
    flash: FlashSettings,
    esptool: String,
}

impl BuildEnv {
    pub fn builder() -> BuildEnvBuilder {
        BuildEnvBuilder::default()
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Directory the generated header is written to
    pub fn include_dir(&self) -> &Path {
        &self.include_dir
    }

    /// Root of the web assets
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn release_dir(&self) -> &Path {
        &self.release_dir
    }

    pub fn defines(&self) -> &Defines {
        &self.defines
    }

    /// Version substituted into web templates, [`version::DEFAULT_VERSION`] without a usable
    /// `APP_VERSION` define
    pub fn embed_version(&self) -> Version {
        Version::from_defines(&self.defines)
            .unwrap_or_else(|| Version::new(version::DEFAULT_VERSION))
    }

    /// Version used in release names, [`package::FALLBACK_VERSION`] without a usable
    /// `APP_VERSION` define
    pub fn release_version(&self) -> Version {
        Version::from_defines(&self.defines)
            .unwrap_or_else(|| Version::new(package::FALLBACK_VERSION))
    }

    /// The target being packaged
    ///
    /// Returns `Error::MissingSetting` when the target name or build directory is unknown.
    pub fn build_target(&self) -> Result<BuildTarget, Error> {
        let name = self
            .target
            .as_ref()
            .ok_or(Error::MissingSetting("target name"))?;
        let build_dir = self
            .build_dir
            .as_ref()
            .ok_or(Error::MissingSetting("build directory"))?;

        Ok(BuildTarget::new(
            name,
            &self.mcu,
            build_dir,
            &self.program_name,
            &self.flash,
        ))
    }

    /// The merge tool for factory images
    pub fn merger(&self) -> Result<Esptool, Error> {
        Esptool::from_command_line(&self.esptool).ok_or(Error::MissingSetting("esptool command"))
    }
}

/// Collects the values the build system provides and fills in defaults for the rest
#[derive(Debug, Default)]
pub struct BuildEnvBuilder {
    project_dir: Option<PathBuf>,
    include_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    release_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    target: Option<String>,
    mcu: Option<String>,
    program_name: Option<String>,
    defines: Option<Defines>,
    flash_mode: Option<String>,
    flash_size: Option<String>,
    esptool: Option<String>,
}

impl BuildEnvBuilder {
    /// Sets the project root, which defaults to the current directory
    pub fn project_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut BuildEnvBuilder {
        self.project_dir = Some(dir.into());
        self
    }

    pub fn include_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut BuildEnvBuilder {
        self.include_dir = Some(dir.into());
        self
    }

    pub fn data_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut BuildEnvBuilder {
        self.data_dir = Some(dir.into());
        self
    }

    pub fn release_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut BuildEnvBuilder {
        self.release_dir = Some(dir.into());
        self
    }

    pub fn build_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut BuildEnvBuilder {
        self.build_dir = Some(dir.into());
        self
    }

    pub fn target<S: Into<String>>(&mut self, name: S) -> &mut BuildEnvBuilder {
        self.target = Some(name.into());
        self
    }

    pub fn mcu<S: Into<String>>(&mut self, mcu: S) -> &mut BuildEnvBuilder {
        self.mcu = Some(mcu.into());
        self
    }

    pub fn program_name<S: Into<String>>(&mut self, name: S) -> &mut BuildEnvBuilder {
        self.program_name = Some(name.into());
        self
    }

    pub fn defines(&mut self, defines: Defines) -> &mut BuildEnvBuilder {
        self.defines = Some(defines);
        self
    }

    pub fn flash_mode<S: Into<String>>(&mut self, mode: S) -> &mut BuildEnvBuilder {
        self.flash_mode = Some(mode.into());
        self
    }

    pub fn flash_size<S: Into<String>>(&mut self, size: S) -> &mut BuildEnvBuilder {
        self.flash_size = Some(size.into());
        self
    }

    pub fn esptool<S: Into<String>>(&mut self, command_line: S) -> &mut BuildEnvBuilder {
        self.esptool = Some(command_line.into());
        self
    }

    /// Builds the final `BuildEnv`, resolving directories relative to the project root
    pub fn build(&self) -> BuildEnv {
        let project_dir = self
            .project_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."));
        let in_project = |dir: &Option<PathBuf>, name: &str| {
            dir.clone().unwrap_or_else(|| project_dir.join(name))
        };

        let include_dir = in_project(&self.include_dir, INCLUDE_DIR);
        let data_dir = in_project(&self.data_dir, DATA_DIR);
        let release_dir = in_project(&self.release_dir, package::RELEASE_DIR);

        let defaults = FlashSettings::default();
        let flash = FlashSettings {
            mode: self.flash_mode.clone().unwrap_or(defaults.mode),
            size: self.flash_size.clone().unwrap_or(defaults.size),
        };

        BuildEnv {
            include_dir,
            data_dir,
            release_dir,
            build_dir: self.build_dir.clone(),
            target: self.target.clone(),
            mcu: self.mcu.clone().unwrap_or_default(),
            program_name: self
                .program_name
                .clone()
                .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string()),
            defines: self.defines.clone().unwrap_or_default(),
            flash,
            esptool: self
                .esptool
                .clone()
                .unwrap_or_else(|| DEFAULT_ESPTOOL.to_string()),
            project_dir,
        }
    }
}
