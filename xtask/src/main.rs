use anyhow::Result;
use clap::{Parser, Subcommand};
use firstlight_shader::{ProgramInterface, ProgramSources, SlotKind};
use std::path::{Path, PathBuf};
use std::process::Command;

const VERTEX_SUFFIX: &str = ".vert.wgsl";

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for firstlight")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, shaders, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Compile and link every shader program under a directory
    Shaders {
        #[arg(long, default_value = "assets/shaders")]
        dir: PathBuf,
    },
    /// Build rustdoc for the workspace
    Doc,
    /// Build the entire workspace
    Build,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt --check", &["fmt", "--all", "--", "--check"])?;
            run_clippy()?;
            cargo("test", &["test", "--workspace"])?;
            run_shaders(Path::new("assets/shaders"))?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt --check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Shaders { dir } => run_shaders(&dir)?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Build => cargo("build", &["build", "--workspace"])?,
    }

    Ok(())
}

fn cargo(what: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {what}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {what} failed");
    }
    Ok(())
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

/// Stems of every `<stem>.vert.wgsl` in `dir`, sorted.
fn program_stems(dir: &Path) -> Result<Vec<String>> {
    let mut stems = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let name = entry?.file_name();
        if let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(VERTEX_SUFFIX)) {
            stems.push(stem.to_owned());
        }
    }
    stems.sort();
    Ok(stems)
}

fn run_shaders(dir: &Path) -> Result<()> {
    println!("==> Linking shader programs in {}", dir.display());
    let stems = program_stems(dir)?;
    if stems.is_empty() {
        anyhow::bail!("no *{VERTEX_SUFFIX} files in {}", dir.display());
    }

    let mut failed = 0;
    for stem in &stems {
        let stages = ProgramSources::from_stem(dir, stem).compile();
        for stage in stages.iter().filter(|stage| !stage.is_compiled()) {
            println!("  {stem}: {} failed\n{}", stage.kind(), stage.info_log());
        }
        match ProgramInterface::link(&stages) {
            Ok(interface) => {
                println!(
                    "  {stem}: ok ({} -> {})",
                    interface.vertex_entry(),
                    interface.fragment_entry()
                );
                for slot in interface.slots() {
                    if !matches!(slot.kind, SlotKind::Uniform { .. }) {
                        println!("    @binding({}) {} {:?}", slot.binding, slot.name, slot.kind);
                    }
                }
                for (location, field) in interface.uniforms().fields().iter().enumerate() {
                    println!("    uniform {location}: {} {}", field.name, field.ty);
                }
            }
            Err(err) => {
                println!("  {stem}: link failed: {err}");
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} shader programs failed", stems.len());
    }
    Ok(())
}
