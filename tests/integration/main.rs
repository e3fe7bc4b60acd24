//! Integration tests for plugcache

mod host {
    //! A minimal archive-building host: walks input archives, routes the
    //! cache entry to the transformer, copies everything else, and appends
    //! the merged entry at the end.

    use plugcache::{PlugcacheResult, RelocatorRef, ResourceTransformer, TransformerContext};
    use std::io::{self, Write};

    pub type Archive = Vec<(String, Vec<u8>)>;

    /// Output archive that tracks entry boundaries and refuses writes once closed
    #[derive(Default)]
    pub struct ArchiveWriter {
        pub entries: Vec<(String, Vec<u8>)>,
        pub flushes: usize,
        closed: bool,
    }

    impl ArchiveWriter {
        pub fn start_entry(&mut self, name: &str) {
            self.entries.push((name.to_string(), Vec::new()));
        }

        pub fn finish(&mut self) {
            self.closed = true;
        }

        pub fn entry(&self, name: &str) -> Option<&[u8]> {
            self.entries
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, data)| data.as_slice())
        }
    }

    impl Write for ArchiveWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.closed {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "archive closed"));
            }
            match self.entries.last_mut() {
                Some((_, data)) => {
                    data.extend_from_slice(buf);
                    Ok(buf.len())
                }
                None => Err(io::Error::new(io::ErrorKind::InvalidInput, "no open entry")),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            self.flushes += 1;
            Ok(())
        }
    }

    pub fn build(
        inputs: &[Archive],
        relocators: &[RelocatorRef],
        transformer: &mut dyn ResourceTransformer,
        out: &mut ArchiveWriter,
    ) -> PlugcacheResult<()> {
        for archive in inputs {
            for (path, data) in archive {
                if transformer.can_transform_resource(path) {
                    let mut input = data.as_slice();
                    transformer.transform(TransformerContext {
                        path,
                        input: &mut input,
                        relocators,
                    })?;
                } else {
                    out.start_entry(path);
                    out.write_all(data).expect("copy entry");
                }
            }
        }

        if transformer.has_transformed_resource() {
            out.start_entry(transformer.resource_path());
            transformer.modify_output(out)?;
        }

        // The host keeps writing after the merged entry
        out.start_entry("META-INF/MANIFEST.MF");
        out.write_all(b"Manifest-Version: 1.0\n").expect("write manifest");
        out.finish();
        Ok(())
    }
}

mod merge_tests {
    use crate::host::{self, Archive, ArchiveWriter};
    use plugcache::config::{Config, ConfigManager, StagingConfig, DEFAULT_RESOURCE_PATH};
    use plugcache::registry::{decode, encode};
    use plugcache::{
        PluginCacheTransformer, PrefixRelocator, Registry, RegistryEntry, RelocatorRef,
        ResourceTransformer,
    };
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn cache(category: &str, entries: &[(&str, &str)]) -> Vec<u8> {
        let mut registry = Registry::new();
        for (key, class_name) in entries {
            registry.insert(category, RegistryEntry::new(*key, *class_name));
        }
        encode(&registry).unwrap()
    }

    fn archive(cache_bytes: Vec<u8>, class: &str) -> Archive {
        vec![
            (format!("{}.class", class.replace('.', "/")), vec![0xCA, 0xFE]),
            (DEFAULT_RESOURCE_PATH.to_string(), cache_bytes),
        ]
    }

    fn transformer(staging: &TempDir) -> PluginCacheTransformer {
        PluginCacheTransformer::new(Config {
            staging: StagingConfig {
                dir: Some(staging.path().to_path_buf()),
                ..StagingConfig::default()
            },
            ..Config::default()
        })
    }

    #[test]
    fn merges_and_relocates_two_modules() {
        let staging = TempDir::new().unwrap();
        let inputs = vec![
            archive(cache("Plugin", &[("core", "com.example.Core")]), "com.example.Core"),
            archive(cache("plugin", &[("extra", "com.example.Extra")]), "com.example.Extra"),
        ];
        let relocators: Vec<RelocatorRef> = vec![Arc::new(PrefixRelocator::new(
            "com.example.",
            "com.shaded.example.",
        ))];
        let mut transformer = transformer(&staging);
        let mut out = ArchiveWriter::default();

        host::build(&inputs, &relocators, &mut transformer, &mut out).unwrap();

        let merged = decode(out.entry(DEFAULT_RESOURCE_PATH).unwrap()).unwrap();
        let mut expected = Registry::new();
        expected.insert("plugin", RegistryEntry::new("core", "com.shaded.example.Core"));
        expected.insert("plugin", RegistryEntry::new("extra", "com.shaded.example.Extra"));
        assert_eq!(merged, expected);

        // Entry written and flushed before the host's next entry
        let names: Vec<_> = out.entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "com/example/Core.class",
                "com/example/Extra.class",
                DEFAULT_RESOURCE_PATH,
                "META-INF/MANIFEST.MF",
            ]
        );
        assert!(out.flushes >= 1);
        assert_eq!(
            out.entry("META-INF/MANIFEST.MF").unwrap(),
            b"Manifest-Version: 1.0\n"
        );

        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
    }

    #[test]
    fn single_module_without_relocation_is_skipped() {
        let staging = TempDir::new().unwrap();
        let inputs = vec![archive(cache("core", &[("a", "x.A")]), "x.A")];
        let mut transformer = transformer(&staging);
        let mut out = ArchiveWriter::default();

        host::build(&inputs, &[], &mut transformer, &mut out).unwrap();

        assert!(out.entry(DEFAULT_RESOURCE_PATH).is_none());
    }

    #[test]
    fn corrupt_cache_fails_build_and_cleans_up() {
        let staging = TempDir::new().unwrap();
        let inputs = vec![
            archive(cache("core", &[("a", "x.A")]), "x.A"),
            archive(vec![0, 0, 0, 1, 0, 9, b'c'], "x.B"),
        ];
        let mut transformer = transformer(&staging);
        let mut out = ArchiveWriter::default();

        let err = host::build(&inputs, &[], &mut transformer, &mut out).unwrap_err();

        assert!(err.is_malformed());
        assert!(err.to_string().contains("fragment #1"));
        assert_eq!(out.entry(DEFAULT_RESOURCE_PATH), Some(&[][..]));
        assert_eq!(fs::read_dir(staging.path()).unwrap().count(), 0);
        assert!(!transformer.has_transformed_resource());
    }

    #[test]
    fn transformer_from_config_file() {
        let temp = TempDir::new().unwrap();
        let config_path = temp.path().join("config.toml");
        fs::write(
            &config_path,
            r#"
                [resource]
                path = "custom/Plugins.dat"

                [staging]
                backend = "memory"
            "#,
        )
        .unwrap();

        let config = ConfigManager::with_path(config_path).load().unwrap();
        let mut transformer = PluginCacheTransformer::new(config);
        let inputs = vec![
            vec![("custom/Plugins.dat".to_string(), cache("core", &[("a", "x.A")]))],
            vec![("custom/Plugins.dat".to_string(), cache("core", &[("a", "y.A")]))],
        ];
        let mut out = ArchiveWriter::default();

        host::build(&inputs, &[], &mut transformer, &mut out).unwrap();

        let merged = decode(out.entry("custom/Plugins.dat").unwrap()).unwrap();
        assert_eq!(merged.get("core", "a").unwrap().class_name, "y.A");
    }
}
