use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mosaic",
    about = "Mosaic: versioned component workspaces over a content-addressed store",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage the dependency policy of tracked components
    Deps {
        #[command(subcommand)]
        command: DepsCommands,
    },

    /// Show where a dependency is used (shorthand for `deps usage`)
    Why {
        /// Package name or component id, optionally with `@version`
        dep: String,

        /// Also ask the package manager for transitive usage chains
        #[arg(long)]
        deep: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Report whether a component changed since its last snapshot
    Status {
        /// Component id, `[scope/]name[@version]`
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Snapshot matched components into the workspace scope
    Snap {
        /// Component id pattern (comma-separated globs, `!` negates)
        pattern: String,

        /// Snapshot message
        #[arg(short, long)]
        message: String,

        /// Record the snapshot under a named tag
        #[arg(long)]
        tag: Option<String>,

        /// Author recorded in the snapshot log
        #[arg(long)]
        author: Option<String>,

        /// Author email recorded in the snapshot log
        #[arg(long)]
        email: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum DepsCommands {
    /// Pin packages in the policy of every matched component
    Set {
        /// Component id pattern (comma-separated globs, `!` negates)
        pattern: String,

        /// Package specs: `name` or `name@version` (`latest` resolves)
        #[arg(required = true)]
        packages: Vec<String>,

        /// Write into devDependencies
        #[arg(long, conflicts_with = "peer")]
        dev: bool,

        /// Write into peerDependencies
        #[arg(long)]
        peer: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove packages from every matched component
    Remove {
        /// Component id pattern (comma-separated globs, `!` negates)
        pattern: String,

        /// Package specs: `name` or `name@version`
        #[arg(required = true)]
        packages: Vec<String>,

        /// Only consider devDependencies
        #[arg(long, conflicts_with = "peer")]
        dev: bool,

        /// Only consider peerDependencies
        #[arg(long)]
        peer: bool,

        /// Only remove entries the component's own policy declares;
        /// never tombstone inherited ones
        #[arg(long)]
        if_exists: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Drop the dependency fields from each matched component's policy
    Reset {
        /// Component id pattern (comma-separated globs, `!` negates)
        pattern: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Materialize inherited dependencies into each component's own policy
    Eject {
        /// Component id pattern (comma-separated globs, `!` negates)
        pattern: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show every component that resolves a dependency
    Usage {
        /// Package name or component id, optionally with `@version`
        dep: String,

        /// Also ask the package manager for transitive usage chains
        #[arg(long)]
        deep: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show which snapshots changed a dependency's version
    Blame {
        /// Component id
        component: String,

        /// Dependency name
        dep: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Dump the resolved dependency state of one component
    Debug {
        /// Component id, `[scope/]name[@version]`
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
