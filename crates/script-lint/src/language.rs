//! Script languages and the surface-token classifier.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Grammars the checker knows how to validate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    /// POSIX-ish shell, checked with `bash -n`.
    Bash,

    /// PowerShell, checked with the PSParser tokenizer.
    PowerShell,
}

impl ScriptLanguage {
    /// Canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            ScriptLanguage::Bash => "bash",
            ScriptLanguage::PowerShell => "powershell",
        }
    }

    /// File suffix used for the temporary file handed to the interpreter.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            ScriptLanguage::Bash => ".sh",
            ScriptLanguage::PowerShell => ".ps1",
        }
    }
}

impl std::fmt::Display for ScriptLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a language name is not one of the known aliases.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown script language: {0}")]
pub struct UnknownLanguage(pub String);

impl FromStr for ScriptLanguage {
    type Err = UnknownLanguage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bash" | "sh" => Ok(ScriptLanguage::Bash),
            "powershell" | "ps" | "pwsh" => Ok(ScriptLanguage::PowerShell),
            _ => Err(UnknownLanguage(s.to_string())),
        }
    }
}

const POWERSHELL_TOKENS: &[&str] = &["new-item", "get-counter", "logman "];
const POWERSHELL_MARKER: &str = "#ps";

const BASH_SHEBANGS: &[&str] = &["#!/bin/bash", "#!/usr/bin/env bash"];
const BASH_TOKENS: &[&str] = &[
    "#!/bin/sh", "mkdir ", "uptime", "echo ", "if [", "fi", "&&", "||",
];

/// Guess which grammar a snippet belongs to.
///
/// Advisory only: PowerShell cmdlet tokens win over shell idioms, and
/// anything without a signal is treated as Bash.
pub fn classify(snippet: &str) -> ScriptLanguage {
    let text = snippet.trim().to_lowercase();

    if POWERSHELL_TOKENS.iter().any(|t| text.contains(t)) || text.starts_with(POWERSHELL_MARKER) {
        return ScriptLanguage::PowerShell;
    }

    if BASH_SHEBANGS.iter().any(|s| text.starts_with(s))
        || BASH_TOKENS.iter().any(|t| text.contains(t))
    {
        return ScriptLanguage::Bash;
    }

    ScriptLanguage::Bash
}
