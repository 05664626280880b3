use clap::Parser;
use cli::{CliConfig, ClusterConfig};

#[test]
fn test_cluster_file_drives_route() {
    let dir = std::env::temp_dir().join(format!("dhash-cli-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("cluster.toml");
    std::fs::write(
        &path,
        "nodes = [\"east\", \"west\"]\n\n[router]\nthreshold = 1\nwindow = 1\n",
    )
    .unwrap();

    let cli = CliConfig::try_parse_from([
        "dhash",
        "--config",
        path.to_str().unwrap(),
        "route",
        "--key",
        "k",
        "--repeat",
        "2",
    ])
    .unwrap();
    let cluster = cli.cluster().unwrap();
    assert_eq!(cluster.router.threshold, 1);

    let mut out = Vec::new();
    cli.execute(&cluster, &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();
    for line in out.lines().take(2) {
        assert!(line.contains("-> east") || line.contains("-> west"));
    }
    std::fs::remove_dir_all(dir).unwrap();
}

#[test]
fn test_missing_cluster_file_names_path() {
    let err = ClusterConfig::load(std::path::Path::new("/nonexistent/cluster.toml")).unwrap_err();
    assert!(format!("{err:#}").contains("/nonexistent/cluster.toml"));
}
