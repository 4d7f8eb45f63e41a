use std::path::Path;

use mlua::{Lua, LuaOptions, StdLib, Table, Value};
use tracing::debug;

use crate::capability::ModuleLoader;
use crate::config::{ReadErrorPolicy, RunnerOptions};
use crate::errors::{Error, Result};
use crate::source::ScriptSource;

/// What a `run` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The script was read, compiled and executed.
    Ran,
    /// The file could not be read and the policy says to swallow that:
    /// nothing was executed.
    Skipped,
}

/// Executes script files inside one embedded Lua state.
///
/// The state's global environment is shared: every script a runner
/// executes, and the host itself through [`Runner::globals`], sees and
/// mutates the same globals. There is no sandbox boundary between host
/// and script: executed code runs with the privileges of the process.
///
/// The interpreter opens base, table, io, os, string, math and utf8;
/// `package` only when a [`ModuleLoader`] capability is granted, and
/// never debug or coroutine. Functions named in the trim list are removed
/// before any script runs.
#[derive(Debug)]
pub struct Runner {
    lua: Lua,
    read_errors: ReadErrorPolicy,
}

impl Runner {
    /// Build a runner from options alone. The module-loading capability
    /// is derived from `options.modules` / `options.module_root`, rooted
    /// at the working directory when no root is configured.
    pub fn new(options: &RunnerOptions) -> Result<Self> {
        let loader = if options.modules {
            Some(match &options.module_root {
                Some(root) => ModuleLoader::rooted_at(root),
                None => ModuleLoader::current_dir()?,
            })
        } else {
            None
        };
        Self::with_capability(options, loader)
    }

    /// Build a runner granting exactly the given capability, regardless
    /// of what `options` says about modules.
    pub fn with_capability(
        options: &RunnerOptions,
        loader: Option<ModuleLoader>,
    ) -> Result<Self> {
        let mut libs = StdLib::TABLE
            | StdLib::IO
            | StdLib::OS
            | StdLib::STRING
            | StdLib::MATH
            | StdLib::UTF8;
        if loader.is_some() {
            libs |= StdLib::PACKAGE;
        }

        let lua = Lua::new_with(libs, LuaOptions::default())?;

        if let Some(ref loader) = loader {
            loader.install(&lua)?;
        }

        for entry in &options.trim {
            trim_function(&lua, entry)?;
        }

        Ok(Self {
            lua,
            read_errors: options.read_errors,
        })
    }

    /// Read the file at `path` and execute its contents.
    ///
    /// Execution strictly follows a complete successful read; a file that
    /// cannot be read executes nothing. Under the default
    /// [`ReadErrorPolicy::Ignore`] the read error is swallowed and the
    /// call reports [`Outcome::Skipped`].
    pub fn run(&self, path: impl AsRef<Path>) -> Result<Outcome> {
        let path = path.as_ref();
        let source = match ScriptSource::read(path) {
            Ok(source) => source,
            Err(err) => {
                return match self.read_errors {
                    ReadErrorPolicy::Ignore => {
                        debug!("ignoring unreadable script {}: {err}", path.display());
                        Ok(Outcome::Skipped)
                    }
                    ReadErrorPolicy::Fail => Err(Error::Io(err)),
                };
            }
        };
        self.execute(&source)?;
        Ok(Outcome::Ran)
    }

    /// Compile `source` as a chunk named after its origin, then call it.
    ///
    /// The phases are distinct: [`Error::Syntax`] means the text never
    /// became a function and nothing ran; [`Error::Eval`] means the chunk
    /// compiled and then threw.
    pub fn execute(&self, source: &ScriptSource) -> Result<()> {
        let origin = source.origin().display().to_string();

        let function = self
            .lua
            .load(source.text())
            .set_name(source.chunk_name())
            .into_function()
            .map_err(|err| match err {
                mlua::Error::SyntaxError { message, .. } => Error::Syntax {
                    chunk: origin.clone(),
                    message,
                },
                other => Error::Lua(other),
            })?;
        debug!("compiled {origin}");

        function.call::<()>(()).map_err(|err| Error::Eval {
            chunk: origin,
            message: err.to_string(),
        })
    }

    /// The shared global environment. Everything a script assigns at top
    /// level is visible here, and everything set here is visible to the
    /// next script.
    pub fn globals(&self) -> Table {
        self.lua.globals()
    }
}

/// Remove one `lib.function` entry from the environment. A missing
/// library is skipped: the trim list may name functions of libraries the
/// runner did not open.
fn trim_function(lua: &Lua, entry: &str) -> Result<()> {
    let (lib, func) = entry
        .split_once('.')
        .ok_or_else(|| Error::Config(format!("invalid trim entry: {entry}")))?;
    let table: Option<Table> = lua.globals().get(lib)?;
    if let Some(table) = table {
        debug!("removing {entry} from the environment");
        table.set(func, Value::Nil)?;
    }
    Ok(())
}
