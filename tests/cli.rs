// Argument parsing of the outlook binary.

use clap::Parser;
use outlook::cli::{Cli, Commands};
use outlook::Hazard;

#[test]
fn parses_classify() {
    let cli = Cli::try_parse_from(["outlook", "classify", "Tornado", "15#"]).unwrap();
    let Commands::Classify(args) = cli.command else { panic!("expected classify") };
    assert_eq!(args.hazard, Hazard::Tornado);
    assert_eq!(args.probability, "15#");
}

#[test]
fn parses_convert_with_flags_and_verbosity() {
    let cli = Cli::try_parse_from(["outlook", "-vv", "convert", "in.json", "-o", "out.geojson", "--force", "--hazards"])
        .unwrap();
    assert_eq!(cli.verbose, 2);
    let Commands::Convert(args) = cli.command else { panic!("expected convert") };
    assert!(args.force && args.hazards);
    assert_eq!(args.output.to_str(), Some("out.geojson"));
    assert!(args.config.is_none());
}

#[test]
fn rejects_unknown_hazard_and_missing_output() {
    assert!(Cli::try_parse_from(["outlook", "classify", "fog", "5%"]).is_err());
    assert!(Cli::try_parse_from(["outlook", "convert", "in.json"]).is_err());
}
