// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 atlas contributors

//! Files written by `atlas init`

/// Template files, relative to the project root
pub(super) fn files(name: &str) -> Vec<(&'static str, String)> {
    vec![
        ("atlas-config.yaml", config(name)),
        ("stages/preprocess.py", stage_script("preprocess", "Clean and split the raw data")),
        ("stages/train.py", stage_script("train", "Fit the model on the training split")),
        ("stages/evaluate.py", stage_script("evaluate", "Score the model on held-out data")),
    ]
}

fn config(name: &str) -> String {
    format!(
        r#"# atlas pipeline for {name}
#
# Each stage runs its script once, breadth-first from the root stage.
# Scripts run from the project root with ATLAS_PROJECT_ROOT set.

pipeline:
  stages:
    preprocess:
      script: stages/preprocess.py
      next_stages:
        - train
      root: true
    train:
      script: stages/train.py
      next_stages:
        - evaluate
    evaluate:
      script: stages/evaluate.py

# Optional process settings:
# runner:
#   interpreters:
#     py: python3 -u
#   env:
#     RANDOM_SEED: "42"
"#
    )
}

fn stage_script(stage: &str, purpose: &str) -> String {
    format!(
        r#""""{purpose}."""


def main() -> None:
    print("{stage}: nothing to do yet")


if __name__ == "__main__":
    main()
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_mentions_project() {
        let files = files("churn");
        assert_eq!(files[0].0, "atlas-config.yaml");
        assert!(files[0].1.contains("atlas pipeline for churn"));
    }
}
