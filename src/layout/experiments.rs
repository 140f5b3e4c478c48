// Clash resolution by depth-first search over label format experiments.

use super::label_placement::{build_label, clashes_with_scene, detect_clashes};
use super::{ExperimentKind, Label, LabelFormat, LayoutContext, Person, Position};
use crate::config::LabelConfig;
use crate::error::MeasureError;
use crate::text_metrics::TextMeasure;
use tracing::{debug, info};

/// A single change applied to a label's format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tweak {
    Position(Position),
    Rows(usize),
    /// Back to the configured position and row count at once.
    Revert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Experiment {
    pub kind: ExperimentKind,
    pub options: Vec<Tweak>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    Resolved(Label),
    /// Carries the last configuration tried.
    StillClashing(Label),
}

/// Expand the configured experiment order into concrete options. Knobs
/// without candidates are dropped.
pub fn plan_experiments(config: &LabelConfig) -> Vec<Experiment> {
    config
        .experiments
        .iter()
        .map(|kind| {
            let options = match kind {
                ExperimentKind::Position => config
                    .position_candidates
                    .iter()
                    .map(|position| Tweak::Position(*position))
                    .collect(),
                ExperimentKind::NumRows => config
                    .row_candidates
                    .iter()
                    .map(|rows| Tweak::Rows(*rows))
                    .collect(),
                ExperimentKind::RevertToDefaultPosition => vec![Tweak::Revert],
            };
            Experiment {
                kind: *kind,
                options,
            }
        })
        .filter(|experiment| !experiment.options.is_empty())
        .collect()
}

pub fn apply_tweak(format: LabelFormat, tweak: Tweak, config: &LabelConfig) -> LabelFormat {
    match tweak {
        Tweak::Position(position) => LabelFormat { position, ..format },
        Tweak::Rows(rows) => LabelFormat { rows, ..format },
        Tweak::Revert => config.default_format(),
    }
}

/// Search for a clash-free format for label `idx`.
///
/// The last experiment is explored first. For each of its options the
/// remaining experiments are searched from the current state before the
/// option itself is applied and checked, so combinations are tried depth
/// first. `labels` and `persons` are only read; the caller commits the
/// outcome.
pub fn search<M: TextMeasure + ?Sized>(
    idx: usize,
    label: Label,
    experiments: &[Experiment],
    labels: &[Label],
    persons: &[Person],
    ctx: &LayoutContext<'_>,
    measurer: &M,
) -> Result<SearchOutcome, MeasureError> {
    let Some((current, rest)) = experiments.split_last() else {
        return Ok(SearchOutcome::StillClashing(label));
    };

    let mut label = label;
    for tweak in &current.options {
        if !rest.is_empty() {
            match search(idx, label, rest, labels, persons, ctx, measurer)? {
                SearchOutcome::Resolved(found) => return Ok(SearchOutcome::Resolved(found)),
                SearchOutcome::StillClashing(last) => label = last,
            }
        }

        let format = apply_tweak(label.format, *tweak, &ctx.config.label);
        let person = &persons[label.person];
        label = build_label(label.person, person, format, ctx, measurer)?;
        if clashes_with_scene(idx, &label.rect, labels, persons) {
            label.clashing = true;
        } else {
            return Ok(SearchOutcome::Resolved(label));
        }
    }

    Ok(SearchOutcome::StillClashing(label))
}

/// Run the search for one clashing label and commit the result, refreshing
/// every clash flag. An unresolved search keeps its last configuration unless
/// that raises the photo's clash count, in which case the label is restored.
pub fn resolve_label<M: TextMeasure + ?Sized>(
    idx: usize,
    plan: &[Experiment],
    labels: &mut [Label],
    persons: &[Person],
    ctx: &LayoutContext<'_>,
    measurer: &M,
) -> Result<bool, MeasureError> {
    let before = labels.iter().filter(|label| label.clashing).count();
    let original = labels[idx].clone();
    let outcome = search(idx, original.clone(), plan, labels, persons, ctx, measurer)?;
    let resolved = matches!(outcome, SearchOutcome::Resolved(_));
    labels[idx] = match outcome {
        SearchOutcome::Resolved(label) | SearchOutcome::StillClashing(label) => label,
    };

    let after = detect_clashes(labels, persons);
    if !resolved && after > before {
        labels[idx] = original;
        detect_clashes(labels, persons);
    }
    Ok(resolved)
}

/// Resolve clashes in up to `optimizer_passes` sweeps, alternating forward
/// and reverse person order. Returns the number of sweeps run.
pub fn optimize<M: TextMeasure + ?Sized>(
    labels: &mut [Label],
    persons: &[Person],
    ctx: &LayoutContext<'_>,
    measurer: &M,
) -> Result<usize, MeasureError> {
    let plan = plan_experiments(&ctx.config.label);
    let mut clashing = detect_clashes(labels, persons);
    let mut passes = 0;

    for pass in 0..ctx.config.photo.optimizer_passes {
        if clashing == 0 {
            break;
        }
        passes += 1;
        let order: Vec<usize> = if pass % 2 == 0 {
            (0..labels.len()).collect()
        } else {
            (0..labels.len()).rev().collect()
        };
        for idx in order {
            if !labels[idx].clashing {
                continue;
            }
            let resolved = resolve_label(idx, &plan, labels, persons, ctx, measurer)?;
            debug!(
                pass,
                label = labels[idx].text.as_str(),
                resolved,
                position = %labels[idx].position(),
                rows = labels[idx].rows(),
                "label search finished"
            );
        }
        clashing = labels.iter().filter(|label| label.clashing).count();
        debug!(pass, clashing, "optimizer sweep finished");
    }

    if clashing > 0 {
        info!(clashing, passes, "accepting overlapping labels");
    }
    Ok(passes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::ir::PhotoDimension;
    use crate::layout::Rect;
    use crate::layout::label_placement::build_labels;
    use crate::text_metrics::{TextSize, TextStyle};
    use std::cell::RefCell;

    struct Stub;

    impl TextMeasure for Stub {
        fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
            let rows: Vec<&str> = text.split('\n').collect();
            let longest = rows.iter().map(|row| row.chars().count()).max().unwrap_or(0);
            Ok(TextSize {
                width: longest as u32 * style.font_size / 2,
                height: rows.len() as u32 * style.font_size,
            })
        }
    }

    fn person(name: &str, rect: Rect) -> Person {
        Person {
            name: name.to_string(),
            rect,
        }
    }

    #[test]
    fn plan_follows_configured_order_and_skips_empty_knobs() {
        let mut config = LabelConfig::default();
        config.row_candidates.clear();
        let plan = plan_experiments(&config);
        let kinds: Vec<ExperimentKind> = plan.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![ExperimentKind::Position, ExperimentKind::RevertToDefaultPosition]
        );
        assert_eq!(plan[1].options, vec![Tweak::Revert]);
    }

    #[test]
    fn revert_restores_both_knobs() {
        let config = LabelConfig::default();
        let moved = LabelFormat {
            position: Position::Left,
            rows: 3,
        };
        assert_eq!(apply_tweak(moved, Tweak::Revert, &config), config.default_format());
        assert_eq!(
            apply_tweak(moved, Tweak::Rows(2), &config),
            LabelFormat {
                position: Position::Left,
                rows: 2
            }
        );
    }

    #[test]
    fn last_experiment_is_explored_outermost() {
        // A face directly below another blocks the "below" label of the top
        // face; with only a position experiment the first free side wins.
        let dim = PhotoDimension::new(1000, 800);
        let mut config = Config::default();
        config.label.experiments = vec![ExperimentKind::Position];
        let ctx = LayoutContext {
            dimension: &dim,
            config: &config,
            font_size: 20,
        };
        let persons = vec![
            person("Top", Rect::new(400, 100, 100, 100)),
            person("Under", Rect::new(400, 210, 100, 100)),
        ];
        let mut labels = build_labels(&persons, &ctx, &Stub).unwrap();
        detect_clashes(&mut labels, &persons);
        assert!(labels[0].clashing);

        let plan = plan_experiments(&config.label);
        let outcome = search(0, labels[0].clone(), &plan, &labels, &persons, &ctx, &Stub).unwrap();
        let SearchOutcome::Resolved(label) = outcome else {
            panic!("expected a free side for the top label");
        };
        assert_eq!(label.position(), Position::Above);
        assert!(!label.clashing);
    }

    #[test]
    fn exhausted_search_reports_last_configuration() {
        // The label cannot escape: every side of the face is covered.
        let dim = PhotoDimension::new(300, 300);
        let mut config = Config::default();
        config.label.experiments = vec![ExperimentKind::Position];
        config.label.position_candidates = vec![Position::Above, Position::Right];
        let ctx = LayoutContext {
            dimension: &dim,
            config: &config,
            font_size: 20,
        };
        let persons = vec![
            person("Centre", Rect::new(100, 100, 100, 100)),
            person("Blanket", Rect::new(0, 0, 300, 300)),
        ];
        let mut labels = build_labels(&persons, &ctx, &Stub).unwrap();
        detect_clashes(&mut labels, &persons);
        let plan = plan_experiments(&config.label);
        let outcome = search(0, labels[0].clone(), &plan, &labels, &persons, &ctx, &Stub).unwrap();
        let SearchOutcome::StillClashing(label) = outcome else {
            panic!("nothing can be free under a blanket face");
        };
        assert_eq!(label.position(), Position::Right);
        assert!(label.clashing);
    }

    #[test]
    fn optimize_separates_neighbours() {
        let dim = PhotoDimension::new(1000, 800);
        let config = Config::default();
        let ctx = LayoutContext {
            dimension: &dim,
            config: &config,
            font_size: 20,
        };
        let persons = vec![
            person("Alexander Hamilton", Rect::new(300, 300, 100, 100)),
            person("Elizabeth Schuyler", Rect::new(420, 300, 100, 100)),
        ];
        let mut labels = build_labels(&persons, &ctx, &Stub).unwrap();
        assert_eq!(detect_clashes(&mut labels, &persons), 2);

        let passes = optimize(&mut labels, &persons, &ctx, &Stub).unwrap();
        assert!(passes >= 1);
        assert_eq!(detect_clashes(&mut labels, &persons), 0);
        assert!(labels.iter().any(|label| label.format != config.label.default_format()));
    }

    #[test]
    fn unresolved_move_that_adds_clashes_is_undone() {
        // Ada's label below touches Bob's face. Moving it left lands on Cy's
        // label, which would turn one clash into two.
        let dim = PhotoDimension::new(1000, 800);
        let mut config = Config::default();
        config.label.default_rows = 1;
        config.label.experiments = vec![ExperimentKind::Position];
        config.label.position_candidates = vec![Position::Left];
        let ctx = LayoutContext {
            dimension: &dim,
            config: &config,
            font_size: 20,
        };
        let persons = vec![
            person("Ada", Rect::new(400, 300, 100, 100)),
            person("Bob", Rect::new(400, 410, 100, 100)),
            person("Cy", Rect::new(350, 300, 50, 40)),
        ];
        let mut labels = build_labels(&persons, &ctx, &Stub).unwrap();
        assert_eq!(detect_clashes(&mut labels, &persons), 1);
        assert!(labels[0].clashing);
        let original = labels[0].clone();

        let plan = plan_experiments(&config.label);
        let resolved = resolve_label(0, &plan, &mut labels, &persons, &ctx, &Stub).unwrap();
        assert!(!resolved);
        assert_eq!(labels[0], original);
        assert!(!labels[2].clashing);
        assert_eq!(labels.iter().filter(|label| label.clashing).count(), 1);
    }

    /// Records the order in which label texts are measured.
    struct Recorder(RefCell<Vec<String>>);

    impl TextMeasure for Recorder {
        fn measure(&self, text: &str, style: &TextStyle) -> Result<TextSize, MeasureError> {
            self.0.borrow_mut().push(text.to_string());
            Stub.measure(text, style)
        }
    }

    #[test]
    fn second_sweep_runs_in_reverse() {
        // A face covering the whole photo keeps every label clashing, so each
        // sweep visits every label.
        let dim = PhotoDimension::new(300, 300);
        let mut config = Config::default();
        config.label.default_rows = 1;
        config.label.experiments = vec![ExperimentKind::Position];
        config.photo.optimizer_passes = 2;
        let ctx = LayoutContext {
            dimension: &dim,
            config: &config,
            font_size: 20,
        };
        let persons = vec![
            person("Ann", Rect::new(100, 100, 20, 20)),
            person("Ben", Rect::new(180, 180, 20, 20)),
            person("Zed", Rect::new(0, 0, 300, 300)),
        ];
        let mut labels = build_labels(&persons, &ctx, &Stub).unwrap();

        let recorder = Recorder(RefCell::new(Vec::new()));
        let passes = optimize(&mut labels, &persons, &ctx, &recorder).unwrap();
        assert_eq!(passes, 2);
        assert!(labels.iter().all(|label| label.clashing));

        let mut visited = recorder.0.into_inner();
        visited.dedup();
        assert_eq!(visited, vec!["Ann", "Ben", "Zed", "Ben", "Ann"]);
    }

    #[test]
    fn zero_passes_leaves_clashes_flagged() {
        let dim = PhotoDimension::new(1000, 800);
        let mut config = Config::default();
        config.photo.optimizer_passes = 0;
        let ctx = LayoutContext {
            dimension: &dim,
            config: &config,
            font_size: 20,
        };
        let persons = vec![
            person("Alexander Hamilton", Rect::new(300, 300, 100, 100)),
            person("Elizabeth Schuyler", Rect::new(420, 300, 100, 100)),
        ];
        let mut labels = build_labels(&persons, &ctx, &Stub).unwrap();
        assert_eq!(optimize(&mut labels, &persons, &ctx, &Stub).unwrap(), 0);
        assert!(labels.iter().all(|label| label.clashing));
    }
}
