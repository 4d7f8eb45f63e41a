use std::io;
use std::path::{Path, PathBuf};

use mlua::{Lua, Table};
use tracing::debug;

/// Module-loading capability, rooted at a fixed base directory.
///
/// Granting the capability gives the executed script a `require` that
/// resolves module names against `root` only, never against the script's
/// own location or the interpreter's built-in search path.
/// A runner without the capability exposes no `require` at all.
#[derive(Debug, Clone)]
pub struct ModuleLoader {
    root: PathBuf,
}

impl ModuleLoader {
    /// Capability rooted at `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Capability rooted at the process working directory at the time of
    /// the call.
    pub fn current_dir() -> io::Result<Self> {
        Ok(Self::rooted_at(std::env::current_dir()?))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lua search path covering plain modules and `init.lua` packages
    /// beneath the root.
    fn search_path(&self) -> String {
        let root = self.root.display();
        format!("{root}/?.lua;{root}/?/init.lua")
    }

    /// Point the interpreter's module resolution at the capability root.
    /// Replaces `package.path` outright and empties `package.cpath`; no
    /// native modules are loadable through this capability.
    pub(crate) fn install(&self, lua: &Lua) -> mlua::Result<()> {
        debug!("module capability rooted at {}", self.root.display());
        let package: Table = lua.globals().get("package")?;
        package.set("path", self.search_path())?;
        package.set("cpath", "")?;
        Ok(())
    }
}
