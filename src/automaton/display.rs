use std::fmt::Display;

use itertools::Itertools;
#[cfg(feature = "graphviz")]
use tracing::{debug, trace};

use super::{Automaton, Label, State};
use crate::show::Show;

fn quoted(state: &State) -> String {
    format!("\"{}\"", state.name().replace('\\', "\\\\").replace('"', "\\\""))
}

impl Automaton {
    /// Returns a string representation of the transition table. The rows are the states,
    /// the initial state is marked with `→` and final states with `*`. There is a column
    /// for every alphabet symbol and an additional `ε` column if epsilon transitions exist.
    pub fn build_transition_table(&self) -> String {
        let labels = self
            .has_epsilon_transitions()
            .then_some(Label::Epsilon)
            .into_iter()
            .chain(self.alphabet.iter().map(|c| Label::Symbol(*c)))
            .collect_vec();

        let mut builder = tabled::builder::Builder::default();
        builder.push_record(
            std::iter::once("State".to_string()).chain(labels.iter().map(|l| l.to_string())),
        );
        for q in &self.states {
            let marker = match (self.initial.as_ref() == Some(q), self.is_final(q)) {
                (true, true) => "→*",
                (true, false) => "→",
                (false, true) => "*",
                (false, false) => "",
            };
            let mut row = vec![format!("{marker}{q}")];
            for label in &labels {
                let targets = self.successors(q, *label);
                row.push(match targets.len() {
                    0 => "-".to_string(),
                    1 => targets.iter().join(""),
                    _ => targets.show(),
                });
            }
            builder.push_record(row);
        }

        builder
            .build()
            .with(tabled::settings::Style::rounded())
            .to_string()
    }

    /// Compute the graphviz representation, for more information on the DOT format,
    /// see the [graphviz documentation](https://graphviz.org/doc/info/lang.html).
    /// Parallel transitions between the same pair of states are merged into one edge
    /// whose label lists all symbols.
    pub fn dot_representation(&self) -> String {
        let header = [
            "digraph A {".to_string(),
            "rankdir=LR".to_string(),
            "init [label=\"\", shape=none]".to_string(),
        ];

        let states = self.states.iter().map(|q| {
            let shape = if self.is_final(q) {
                "doublecircle"
            } else {
                "circle"
            };
            format!("{} [shape={shape}]", quoted(q))
        });

        let initial = self
            .initial
            .iter()
            .map(|q| format!("init -> {}", quoted(q)));

        let transitions = self
            .transitions()
            .map(|(p, l, q)| ((p, q), l))
            .into_group_map()
            .into_iter()
            .sorted()
            .map(|((p, q), labels)| {
                format!(
                    "{} -> {} [label=\"{}\"]",
                    quoted(p),
                    quoted(q),
                    labels.into_iter().sorted().join(", ")
                )
            });

        header
            .into_iter()
            .chain(states)
            .chain(initial)
            .chain(transitions)
            .chain(std::iter::once("}".to_string()))
            .join("\n")
    }

    /// PNG image of [`Automaton::dot_representation`], obtained by piping the DOT source
    /// through the `dot` executable, which has to be on the `PATH`.
    #[cfg(feature = "graphviz")]
    pub fn render(&self) -> Result<Vec<u8>, std::io::Error> {
        use std::io::Write;
        use std::process::{Command, Stdio};

        let mut dot = Command::new("dot")
            .arg("-Tpng")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;
        if let Some(mut source) = dot.stdin.take() {
            source.write_all(self.dot_representation().as_bytes())?;
        }
        let image = dot.wait_with_output()?;
        if !image.status.success() {
            return Err(dot_failed(image.status));
        }
        debug!("rendered {} states into {} bytes", self.size(), image.stdout.len());
        Ok(image.stdout)
    }

    /// Writes the PNG image to `path`. The DOT source is handed to `dot` through a
    /// temporary file that is removed again afterwards.
    #[cfg(feature = "graphviz")]
    pub fn render_to_file_name(&self, path: &str) -> Result<(), std::io::Error> {
        use std::io::Write;

        let mut source = tempfile::Builder::new().suffix(".dot").tempfile()?;
        source.write_all(self.dot_representation().as_bytes())?;
        source.flush()?;
        trace!("rendering {} to {path}", source.path().display());

        let status = std::process::Command::new("dot")
            .arg("-Tpng")
            .arg("-o")
            .arg(path)
            .arg(source.path())
            .status()?;
        match status.success() {
            true => Ok(()),
            false => Err(dot_failed(status)),
        }
    }
}

#[cfg(feature = "graphviz")]
fn dot_failed(status: std::process::ExitStatus) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, format!("`dot` exited with {status}"))
}

impl Display for Automaton {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.build_transition_table())
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn sample() -> Automaton {
        Automaton::builder()
            .with_alphabet(['a', 'b'])
            .with_transitions([("q0", 'a', "q0"), ("q0", 'a', "q1"), ("q0", 'b', "q1")])
            .with_epsilon_transitions([("q1", "q0")])
            .with_initial("q0")
            .with_finals(["q1"])
            .build()
            .unwrap()
    }

    #[test]
    fn transition_table_marks_initial_and_finals() {
        let table = sample().to_string();
        assert!(table.contains("→q0"));
        assert!(table.contains("*q1"));
        assert!(table.contains("{q0, q1}"));
        assert!(table.contains("ε"));
    }

    #[test]
    fn dot_merges_parallel_edges() {
        let dot = sample().dot_representation();
        assert!(dot.starts_with("digraph A {"));
        assert!(dot.contains("\"q1\" [shape=doublecircle]"));
        assert!(dot.contains("init -> \"q0\""));
        assert!(dot.contains("\"q0\" -> \"q1\" [label=\"a, b\"]"));
        assert!(dot.contains("\"q1\" -> \"q0\" [label=\"ε\"]"));
        assert!(dot.ends_with('}'));
    }

    #[cfg(feature = "graphviz")]
    #[test_log::test]
    fn render_produces_png() {
        if std::process::Command::new("dot").arg("-V").output().is_err() {
            tracing::warn!("`dot` is not installed, skipping");
            return;
        }
        let image = sample().render().unwrap();
        assert!(image.starts_with(&[0x89, b'P', b'N', b'G']));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.png");
        sample().render_to_file_name(path.to_str().unwrap()).unwrap();
        assert!(std::fs::read(&path).unwrap().starts_with(&[0x89, b'P', b'N', b'G']));
    }
}
