use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::{split, Action};

/// Everything needed for a single run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Files written into the run's copy of the filesystem before the
    /// interpreter starts, keyed by absolute path.
    pub files: BTreeMap<String, Bytes>,
    /// The file handed to the interpreter.
    pub main_path: String,
    /// One of the [`Action`] names. Anything else is rejected by
    /// [`Harness::run`](crate::Harness::run) before the sandbox is touched.
    pub action: String,
    /// Arguments appended after `main_path`.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(main_path: impl Into<String>, action: Action) -> Self {
        ExecutionRequest {
            files: BTreeMap::new(),
            main_path: main_path.into(),
            action: action.as_str().to_string(),
            extra_args: Vec::new(),
        }
    }

    /// Split a multi-file buffer and place every section in the request.
    ///
    /// The unnamed leading section becomes `main_path`. Named sections are
    /// written next to it, padded so their line numbers match `text`.
    pub fn from_source(text: &str, main_path: &str, action: Action) -> Self {
        let split = split::split(text);
        let directory = match main_path.rsplit_once('/') {
            Some((parent, _)) => parent,
            None => "",
        };

        let mut request = ExecutionRequest::new(main_path, action)
            .with_file(main_path, split.remaining.into_bytes());

        for file in split.files.values() {
            let path = if file.name.starts_with('/') {
                file.name.clone()
            } else {
                format!("{directory}/{}", file.name)
            };
            request = request.with_file(path, file.aligned_content().into_bytes());
        }

        request
    }

    pub fn with_file(mut self, path: impl Into<String>, contents: impl Into<Bytes>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// The arguments after `argv[0]`.
    pub(crate) fn args(&self, action: Action) -> Vec<String> {
        action
            .flags()
            .iter()
            .map(|flag| flag.to_string())
            .chain(std::iter::once(self.main_path.clone()))
            .chain(self.extra_args.iter().cloned())
            .collect()
    }
}
