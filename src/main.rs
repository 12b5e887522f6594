use clap::{Parser, Subcommand};
use mygit::commands;
use mygit::object::ObjectKind;

#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty Git repository
    Init,

    /// Provide content or type and size information for repository objects
    CatFile {
        /// Show object type
        #[arg(short, conflicts_with = "size_only")]
        type_only: bool,

        /// Show object size
        #[arg(short, conflicts_with = "type_only")]
        size_only: bool,

        /// Pretty-print object's content
        #[arg(short, conflicts_with_all = ["size_only", "type_only"])]
        pretty_print: bool,

        /// Object hash
        #[arg(id = "object")]
        hash: String,
    },

    /// Compute object ID and optionally create an object from a file
    HashObject {
        /// Actually write the object into the object database
        #[arg(short)]
        write: bool,

        /// Object type
        #[arg(short, id = "type", default_value = "blob")]
        typ: String,

        #[arg(id = "file")]
        file: String,
    },

    /// List the contents of a tree object
    LsTree {
        /// List only filenames
        #[arg(long, conflicts_with = "object_only")]
        name_only: bool,

        /// List only object ids
        #[arg(long, conflicts_with = "name_only")]
        object_only: bool,

        /// Recurse into sub-trees
        #[arg(short = 'r')]
        recurse: bool,

        /// Tree hash
        #[arg(id = "tree-ish")]
        hash: String,
    },

    /// Write the current working tree as a tree object
    WriteTree,

    /// Create a commit object from a tree
    CommitTree {
        /// Tree hash
        tree: String,

        /// Parent commit hash
        #[arg(short = 'p')]
        parent: Option<String>,

        /// Commit message
        #[arg(short = 'm')]
        message: String,
    },

    /// Clone a repository into a new directory
    Clone {
        /// Remote URL, https:// only
        repository: String,

        /// Destination directory
        directory: Option<String>,
    },

    /// Get or set config options
    Config {
        #[arg(long)]
        global: bool,

        /// Add `key` = `value` to the config
        #[arg(long, conflicts_with = "get")]
        add: bool,

        /// Print the value of `key`
        #[arg(long, conflicts_with = "add")]
        get: bool,

        key: String,

        /// Required with `--add`, ignored with `--get`
        value: Option<String>,
    },
}

fn main() {
    env_logger::init();

    if let Err(err) = run() {
        eprintln!("fatal: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let args = Cli::parse();
    match args.command {
        Commands::Init => commands::init::invoke(),
        Commands::CatFile {
            pretty_print: _,
            type_only,
            size_only,
            hash,
        } => commands::cat_file::invoke(&hash, type_only, size_only),
        Commands::HashObject { write, file, typ } => {
            let kind = ObjectKind::from_name(&typ)
                .ok_or_else(|| anyhow::anyhow!("unknown object type '{typ}'"))?;
            let hash = commands::hash_object::invoke(&file, write, kind)?;
            println!("{}", mygit::codec::hex_encode(&hash));
            Ok(())
        }
        Commands::LsTree {
            name_only,
            object_only,
            recurse,
            hash,
        } => commands::ls_tree::invoke(&hash, recurse, name_only, object_only),
        Commands::WriteTree => commands::write_tree::invoke(),
        Commands::CommitTree {
            tree,
            parent,
            message,
        } => {
            let hash = commands::commit_tree::invoke(&tree, &message, parent)?;
            println!("{}", mygit::codec::hex_encode(&hash));
            Ok(())
        }
        Commands::Clone {
            repository,
            directory,
        } => commands::clone::invoke(&repository, directory),
        Commands::Config {
            global,
            add,
            get,
            key,
            value,
        } => {
            anyhow::ensure!(global, "only --global config is supported");
            anyhow::ensure!(add != get, "specify exactly one of --add or --get");
            if add {
                let value = value
                    .ok_or_else(|| anyhow::anyhow!("--add requires a value"))?;
                commands::config::add(&key, &value)
            } else {
                commands::config::get(&key)
            }
        }
    }
}
