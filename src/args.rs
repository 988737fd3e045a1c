use clap::Parser;

/// This is a grading program for multiple-choice answer sheets.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the exam: answer key, student files, roster
    /// and outputs. For more information about the file format, read the documentation of
    /// answer_grading::manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, mcgrade checks that the
    /// computed summary matches the reference and fails otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary is written in JSON format to the
    /// given location. Setting this option overrides the path that may be specified with the
    /// --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the results are written as a CSV table to the given
    /// location.
    #[clap(long, value_parser)]
    pub csv_out: Option<String>,

    /// (file path, repeatable) A file of student answers. Replaces the student files of the
    /// configuration.
    #[clap(short, long, value_parser)]
    pub students: Vec<String>,

    /// (file path) The answer key. Required when --config is not used.
    #[clap(short, long, value_parser)]
    pub key: Option<String>,

    /// (file path, optional) The roster used to find the names of the students.
    #[clap(long, value_parser)]
    pub roster: Option<String>,

    /// (standard or tamgu) The layout of the student files.
    #[clap(long, value_parser)]
    pub layout: Option<String>,

    /// (csv or xlsx) The type of the student files. By default it follows the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using Excel student files, the name of the worksheet to use. By default the first
    /// one.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (subject code) If specified, the statistics only cover this subject.
    #[clap(long, value_parser)]
    pub subject: Option<String>,

    /// The name of the exam in the summary.
    #[clap(long, value_parser)]
    pub exam_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
