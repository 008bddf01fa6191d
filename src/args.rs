use clap::Parser;

/// Tabulates a ranked-choice race into its top placements.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the election description in JSON: candidates,
    /// ballots or ballot files, and rules. See the manual of ranked_placement for the format.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference summary in JSON format. If provided, racetally will
    /// check that the tabulated summary matches the reference, and fail otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified in the configuration.
    /// An empty value is the same as not passing the option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (number, default 3) The number of placements to compute. Overrides the topN rule of the configuration.
    #[clap(long, value_parser)]
    pub top_n: Option<u32>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
