use std::fs::{self, File};
use std::io::Write;

use tempfile::tempdir;

use rom_curator_core::fingerprint::Fingerprint;
use rom_curator_core::normalize::NameNormalizer;
use rom_curator_core::scanner;
use rom_curator_core::{AppConfig, SilentReporter};

fn config_for(root: &std::path::Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.roms_path = root.to_path_buf();
    config
}

#[test]
fn test_scan_builds_fingerprinted_items() {
    let dir = tempdir().unwrap();
    let rom = dir.path().join("Super Mario Bros. (USA).nes");
    let content = b"not a real cartridge image, but bytes are bytes";
    fs::write(&rom, content).unwrap();

    let config = config_for(dir.path());
    let items = scanner::collect_items(
        &config,
        dir.path(),
        &NameNormalizer::default(),
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(items.len(), 1);
    let item = &items[0];
    assert_eq!(item.category, "Nintendo - Nintendo Entertainment System");
    assert_eq!(item.base_name, "Super Mario Bros.");
    assert_eq!(item.region.as_deref(), Some("USA"));
    assert_eq!(item.size, content.len() as u64);
    assert_eq!(item.fingerprint, Some(Fingerprint::from_bytes(content)));
}

#[test]
fn test_zip_member_checksum_is_read_from_the_archive() {
    let dir = tempdir().unwrap();
    let zip_path = dir.path().join("Battle City (Japan).zip");
    let content = b"zip member payload standing in for a cartridge";
    {
        let file = File::create(&zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("Battle City (Japan).nes", zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
        writer.finish().unwrap();
    }

    let config = config_for(dir.path());
    let items = scanner::collect_items(
        &config,
        dir.path(),
        &NameNormalizer::default(),
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(items.len(), 1);
    // The stored member CRC equals the checksum of the uncompressed bytes.
    assert_eq!(
        items[0].fingerprint,
        Some(Fingerprint::from_bytes(content))
    );
}

#[test]
fn test_fingerprinting_can_be_skipped() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("Metroid (USA).nes"), b"some bytes").unwrap();

    let mut config = config_for(dir.path());
    config.scan.fingerprint = false;

    let items = scanner::collect_items(
        &config,
        dir.path(),
        &NameNormalizer::default(),
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].fingerprint, None);
    assert_eq!(items[0].base_name, "Metroid");
}

#[test]
fn test_ignore_patterns_and_unknown_extensions() {
    let dir = tempdir().unwrap();
    let skipped_dir = dir.path().join("skipme");
    fs::create_dir_all(&skipped_dir).unwrap();
    fs::write(skipped_dir.join("Hidden Game.nes"), b"hidden").unwrap();
    fs::write(dir.path().join("readme.txt"), b"not a rom").unwrap();
    fs::write(dir.path().join("Kept Game.nes"), b"kept").unwrap();

    let mut config = config_for(dir.path());
    config.scan.ignore_patterns = vec!["**/skipme/**".to_string()];

    let items = scanner::collect_items(
        &config,
        dir.path(),
        &NameNormalizer::default(),
        &SilentReporter,
    )
    .unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].filename, "Kept Game.nes");
}

#[test]
fn test_items_come_back_sorted_by_path() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("b-game.nes"), b"bbbb").unwrap();
    fs::write(dir.path().join("a-game.nes"), b"aaaa").unwrap();
    fs::write(dir.path().join("c-game.nes"), b"cccc").unwrap();

    let config = config_for(dir.path());
    let items = scanner::collect_items(
        &config,
        dir.path(),
        &NameNormalizer::default(),
        &SilentReporter,
    )
    .unwrap();

    let names: Vec<&str> = items.iter().map(|i| i.filename.as_str()).collect();
    assert_eq!(names, vec!["a-game.nes", "b-game.nes", "c-game.nes"]);
}

#[test]
fn test_missing_scan_root_is_an_error() {
    let dir = tempdir().unwrap();
    let config = config_for(dir.path());
    let missing = dir.path().join("does-not-exist");

    let result = scanner::collect_items(
        &config,
        &missing,
        &NameNormalizer::default(),
        &SilentReporter,
    );
    assert!(result.is_err());
}
