use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

#[derive(Debug,Parser)]
#[command(version, about="Generate a BOM from a project repository.")]
#[command(after_long_help="The ALLSPICE_AUTH_TOKEN environment variable must hold a personal access\ntoken for the hub instance; the run aborts if it is unset.")]
pub struct Options {
    /// The repo containing the project, in the form 'owner/repo'
    pub repository : String,
    /// The path to the source file used to generate the BOM. For an Altium
    /// project this is the .PrjPcb file, for an OrCAD project the .dsn file,
    /// for a System Capture project the .sdax file. Example:
    /// 'Archimajor.PrjPcb', 'Schematics/Beagleplay.dsn'.
    pub source_file : String,
    /// A path to a YAML file mapping output columns to the part attributes
    /// they are derived from
    #[arg(long, default_value="columns.yml")]
    pub columns : PathBuf,
    /// The git reference the BOM should be generated for (eg. branch name,
    /// tag name, commit SHA)
    #[arg(long="source_ref", default_value="main")]
    pub source_ref : String,
    /// The URL of your AllSpice Hub instance. Defaults to
    /// https://hub.allspice.io.
    #[arg(long="allspice_hub_url")]
    pub allspice_hub_url : Option<String>,
    /// The path to the output file. If absent, the CSV is written to
    /// standard output
    #[arg(long="output_file")]
    pub output_file : Option<PathBuf>,
    /// A comma-separated list of columns to group the BOM by. If not
    /// present, the BOM will be flat
    #[arg(long="group_by")]
    pub group_by : Option<String>,
    /// The variant of the project to generate the BOM for. If not present,
    /// the BOM is generated for the default variant. Not used for OrCAD
    /// projects
    #[arg(long)]
    pub variant : Option<String>,
    /// Logging verbosity (off, error, warn, info, debug, trace)
    #[arg(long="log-level", default_value="info")]
    pub log_level : LevelFilter
}

impl Options {
    /// The ordered list of column names to group by, split from the
    /// comma-separated flag. `None` when the flag was not given or was
    /// empty.
    pub fn group_by_columns(&self) -> Option<Vec<String>> {
        match self.group_by.as_deref() {
            None | Some("") => { None }
            Some(gb) => { Some(gb.split(',').map(String::from).collect()) }
        }
    }
}
