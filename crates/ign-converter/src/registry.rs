//! Chains pairwise translators to reach any reachable spec version.
//!
//! Every registered translator is one directed edge between two spec
//! versions. [`Registry::translate`] picks the shortest chain of edges from
//! the version of a document to the requested one and applies each hop in
//! order.
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use ign_config::VersionedConfig;
use ign_version::SpecVersion;
use snafu::{OptionExt, ResultExt, Snafu};
use tracing::{debug, instrument};

use crate::{
    document::Document,
    translate::{self, Context, spec2, spec2_to_spec3, spec3, spec3_to_spec2},
};

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Snafu)]
pub enum Error {
    #[snafu(display("no translation from spec {from} to spec {to} is available"))]
    NoTranslationPath { from: SpecVersion, to: SpecVersion },

    #[snafu(display("failed to translate from spec {from} to spec {to}"))]
    Translate {
        source: translate::Error,
        from: SpecVersion,
        to: SpecVersion,
    },

    #[snafu(display("expected a spec {expected} document but got spec {found}"))]
    UnexpectedDocument {
        expected: SpecVersion,
        found: SpecVersion,
    },
}

type BoxedTranslator = Box<dyn Fn(Document, &Context) -> Result<Document>>;

/// Directed graph of translators keyed by `(from, to)`.
pub struct Registry {
    translators: BTreeMap<(SpecVersion, SpecVersion), BoxedTranslator>,
}

impl Default for Registry {
    /// Registers every translator this crate provides.
    fn default() -> Self {
        let mut registry = Self::empty();

        registry.register(|config, _| Ok(spec2::v2_2_to_v2_3(config)));
        registry.register(|config, _| Ok(spec2::v2_3_to_v2_4(config)));
        registry.register(|config, context: &Context| {
            spec2_to_spec3::v2_3_to_v3_0(config, &context.fs_map)
        });
        registry.register(|config, context: &Context| {
            spec2_to_spec3::v2_4_to_v3_1(config, &context.fs_map)
        });
        registry.register(|config, _| Ok(spec3::v3_0_to_v3_1(config)));
        registry.register(|config, _| Ok(spec3::v3_1_to_v3_2(config)));
        registry.register(|config, _| Ok(spec3::v3_2_to_v3_3(config)));
        registry.register(|config, _| Ok(spec3::v3_3_to_v3_4(config)));

        registry.register(|config, _| spec3::v3_4_to_v3_3(config));
        registry.register(|config, _| spec3::v3_3_to_v3_2(config));
        registry.register(|config, _| spec3::v3_2_to_v3_1(config));
        registry.register(|config, _| spec3_to_spec2::v3_1_to_v2_4(config));
        registry.register(|config, _| spec3_to_spec2::v3_0_to_v2_2(config));

        registry
    }
}

impl Registry {
    /// A registry without any translator.
    pub fn empty() -> Self {
        Self {
            translators: BTreeMap::new(),
        }
    }

    /// Registers `translator` as the edge from `S::VERSION` to `D::VERSION`,
    /// replacing any translator previously registered for that pair.
    pub fn register<S, D, F>(&mut self, translator: F)
    where
        S: VersionedConfig + TryFrom<Document, Error = Document> + 'static,
        D: VersionedConfig + Into<Document> + 'static,
        F: Fn(S, &Context) -> translate::Result<D> + 'static,
    {
        let (from, to) = (S::VERSION, D::VERSION);
        let translator = move |document: Document, context: &Context| {
            let config = S::try_from(document).map_err(|document| Error::UnexpectedDocument {
                expected: from,
                found: document.version(),
            })?;
            let translated = translator(config, context).context(TranslateSnafu { from, to })?;
            Ok(translated.into())
        };

        self.translators.insert((from, to), Box::new(translator));
    }

    pub fn contains(&self, from: SpecVersion, to: SpecVersion) -> bool {
        self.translators.contains_key(&(from, to))
    }

    /// Returns the versions a document passes through on its way from `from`
    /// to `to`, both ends included.
    ///
    /// The shortest chain wins. Among chains of equal length the one visiting
    /// lower versions first is chosen.
    pub fn path(&self, from: SpecVersion, to: SpecVersion) -> Option<Vec<SpecVersion>> {
        if from == to {
            return Some(vec![from]);
        }

        let mut previous: BTreeMap<SpecVersion, SpecVersion> = BTreeMap::new();
        let mut visited = BTreeSet::from([from]);
        let mut queue = VecDeque::from([from]);

        while let Some(current) = queue.pop_front() {
            let neighbours = self
                .translators
                .range((current, SpecVersion::new(0, 0))..)
                .take_while(|((source, _), _)| *source == current)
                .map(|((_, destination), _)| *destination);

            for next in neighbours {
                if !visited.insert(next) {
                    continue;
                }
                previous.insert(next, current);

                if next == to {
                    let mut path = vec![to];
                    let mut step = to;
                    while let Some(&before) = previous.get(&step) {
                        path.push(before);
                        step = before;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }

    /// Translates `document` to the spec version `to`.
    #[instrument(skip(self, document, context), fields(from = %document.version()))]
    pub fn translate(
        &self,
        document: Document,
        to: SpecVersion,
        context: &Context,
    ) -> Result<Document> {
        let from = document.version();
        let path = self
            .path(from, to)
            .context(NoTranslationPathSnafu { from, to })?;

        path.windows(2).try_fold(document, |document, hop| {
            let (source, destination) = (hop[0], hop[1]);
            debug!(%source, %destination, "translating");

            let translator = self
                .translators
                .get(&(source, destination))
                .context(NoTranslationPathSnafu {
                    from: source,
                    to: destination,
                })?;
            translator(document, context)
        })
    }
}
