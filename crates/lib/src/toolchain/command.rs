//! Toolchain adapter backed by an external compiler command.
//!
//! Module interfaces are compiled by running the configured compiler with an
//! expanded argument template. Archives are wrapped without any process: the
//! library handle is a content hash of the archive and its link flags.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::process::Command;

use serde::Serialize;
use tracing::{debug, info};

use crate::artifact::Artifact;
use crate::consts::ARCHIVE_EXTENSIONS;
use crate::context::{LibraryDescriptor, LibraryHandle, ModuleArtifacts};
use crate::util::hash::Hashable;

use super::{CompilationError, CompileRequest, LinkError, Toolchain, ToolchainConfig};

/// Runs the configured compiler for interface compilation.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommandToolchain;

impl CommandToolchain {
  pub fn new() -> Self {
    Self
  }
}

/// Inputs identifying a wrapped library.
#[derive(Serialize)]
struct HandleKey<'a> {
  archive: &'a Artifact,
  always_link: bool,
  target: Option<&'a str>,
}

impl Hashable for HandleKey<'_> {}

impl Toolchain for CommandToolchain {
  fn compile_module_interface(
    &self,
    request: &CompileRequest<'_>,
    config: &ToolchainConfig,
  ) -> Result<ModuleArtifacts, CompilationError> {
    let program = config.compiler.as_deref().ok_or(CompilationError::NotConfigured)?;

    let module_out = config.module_out(request.module_name);
    let doc_out = config.doc_out(request.module_name);

    let mut args = expand_template(request, config, &module_out, doc_out.as_ref());
    args.extend(dependency_flags(request, config));

    std::fs::create_dir_all(&config.out_dir).map_err(|e| CompilationError::Spawn {
      program: program.to_string(),
      message: format!("failed to create output directory {}: {}", config.out_dir, e),
    })?;

    // Outputs left by an earlier run must not pass for this run's outputs.
    remove_stale(&module_out)?;
    if let Some(doc) = &doc_out {
      remove_stale(doc)?;
    }

    info!(module = %request.module_name, program = %program, "compiling module interface");
    debug!(args = ?args, "compiler arguments");

    let output = Command::new(program)
      .args(&args)
      .envs(&config.env)
      .output()
      .map_err(|e| CompilationError::Spawn {
        program: program.to_string(),
        message: e.to_string(),
      })?;

    if !output.status.success() {
      return Err(CompilationError::CommandFailed {
        code: output.status.code(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
      });
    }

    if !module_out.path().exists() {
      return Err(CompilationError::MissingOutput(module_out));
    }

    let doc_file = doc_out.filter(|doc| {
      let exists = doc.path().exists();
      if !exists {
        debug!(module = %request.module_name, doc = %doc, "compiler produced no documentation");
      }
      exists
    });

    Ok(ModuleArtifacts {
      module_file: module_out,
      doc_file,
    })
  }

  fn wrap_archive(
    &self,
    archive: &Artifact,
    always_link: bool,
    config: &ToolchainConfig,
  ) -> Result<LibraryDescriptor, LinkError> {
    let is_archive = archive
      .path()
      .extension()
      .and_then(|ext| ext.to_str())
      .is_some_and(|ext| ARCHIVE_EXTENSIONS.contains(&ext));
    if !is_archive {
      return Err(LinkError::NotAnArchive(archive.clone()));
    }

    let key = HandleKey {
      archive,
      always_link,
      target: config.target.as_deref(),
    };
    let hash = key.compute_hash().map_err(|e| LinkError::Handle {
      archive: archive.clone(),
      message: e.to_string(),
    })?;

    Ok(LibraryDescriptor {
      archive: archive.clone(),
      always_link,
      handle: LibraryHandle(hash.0),
    })
  }
}

fn remove_stale(output: &Artifact) -> Result<(), CompilationError> {
  match std::fs::remove_file(output.path()) {
    Ok(()) => {
      debug!(path = %output, "removed stale output");
      Ok(())
    }
    Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
    Err(e) => Err(CompilationError::StaleOutput {
      path: output.clone(),
      message: e.to_string(),
    }),
  }
}

/// Substitute placeholders in `config.compile_args`, then in `config.doc_args`
/// when documentation is requested.
///
/// `compile_args` entries referencing `{doc_out}` are dropped when it is not.
fn expand_template(
  request: &CompileRequest<'_>,
  config: &ToolchainConfig,
  module_out: &Artifact,
  doc_out: Option<&Artifact>,
) -> Vec<String> {
  let doc_args = doc_out.map(|_| config.doc_args.as_slice()).unwrap_or_default();
  config
    .compile_args
    .iter()
    .chain(doc_args)
    .filter_map(|arg| {
      let arg = if arg.contains("{doc_out}") {
        arg.replace("{doc_out}", &doc_out?.0)
      } else {
        arg.clone()
      };
      Some(
        arg
          .replace("{interface}", &request.interface.0)
          .replace("{module_name}", request.module_name)
          .replace("{module_out}", &module_out.0),
      )
    })
    .collect()
}

/// Flags for dependency headers, defines, module maps and module search paths.
fn dependency_flags(request: &CompileRequest<'_>, config: &ToolchainConfig) -> Vec<String> {
  let mut flags = Vec::new();
  let mut seen = HashSet::new();
  let mut push = |flag: String| {
    if seen.insert(flag.clone()) {
      flags.push(flag);
    }
  };

  for ctx in &request.dependency_compilation_contexts {
    for dir in &ctx.include_dirs {
      push(format!("{}{}", config.include_flag, dir));
    }
    for define in &ctx.defines {
      push(format!("{}{}", config.define_flag, define));
    }
    for map in &ctx.module_maps {
      push(format!("{}{}", config.module_map_flag, map));
    }
  }

  for module in &request.dependency_modules {
    if let Some(dir) = module.module_file().and_then(Artifact::dir) {
      push(format!("{}{}", config.module_search_flag, dir));
    }
  }

  flags
}
