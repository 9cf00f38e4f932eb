//! Immutable puzzle registry.
//!
//! Built once at startup from a [`Catalog`] and shared by reference with
//! every component. Construction is the only place the catalog is
//! validated; afterwards lookups never fail, they only return `None`.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use hacklab_types::{Puzzle, PuzzleId, TerminalAction, MAX_HINT_TIERS};
use serde::{Deserialize, Serialize};

/// Catalog validation and loading errors.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("duplicate puzzle id: {0}")]
    DuplicateId(String),

    #[error("puzzle '{0}' has no solutions")]
    NoSolutions(String),

    #[error("puzzle '{0}' has an empty solution")]
    EmptySolution(String),

    #[error("puzzle '{id}' has {count} hint tiers (expected 1 to 3)")]
    HintTiers { id: String, count: usize },

    #[error("puzzle '{puzzle}' depends on unknown puzzle '{dependency}'")]
    UnknownDependency { puzzle: String, dependency: String },

    #[error("dependency cycle through puzzle '{0}'")]
    DependencyCycle(String),

    #[error("action '{verb}' targets unknown puzzle '{puzzle}'")]
    UnknownActionPuzzle { verb: String, puzzle: String },

    #[error("help puzzle '{0}' is not in the catalog")]
    UnknownHelpPuzzle(String),

    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Raw catalog contents, as written in a catalog file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    /// Puzzle solved the first time `help` runs.
    #[serde(default)]
    pub help_puzzle: Option<PuzzleId>,
    #[serde(default, rename = "puzzle")]
    pub puzzles: Vec<Puzzle>,
    #[serde(default, rename = "action")]
    pub actions: Vec<TerminalAction>,
}

impl Catalog {
    /// Parse a catalog from TOML (`[[puzzle]]` and `[[action]]` tables).
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }
}

/// Validated, immutable puzzle catalog.
#[derive(Debug)]
pub struct PuzzleRegistry {
    puzzles: Vec<Puzzle>,
    index: HashMap<PuzzleId, usize>,
    actions: Vec<TerminalAction>,
    help_puzzle: Option<PuzzleId>,
}

impl PuzzleRegistry {
    /// Validate `catalog` and build the registry.
    pub fn new(catalog: Catalog) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(catalog.puzzles.len());
        for (i, puzzle) in catalog.puzzles.iter().enumerate() {
            if index.insert(puzzle.id.clone(), i).is_some() {
                return Err(CatalogError::DuplicateId(puzzle.id.clone()));
            }
            validate_puzzle(puzzle)?;
        }

        for puzzle in &catalog.puzzles {
            for dependency in &puzzle.depends_on {
                if !index.contains_key(dependency) {
                    return Err(CatalogError::UnknownDependency {
                        puzzle: puzzle.id.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
        }
        check_acyclic(&catalog.puzzles, &index)?;

        for action in &catalog.actions {
            if !index.contains_key(&action.puzzle_id) {
                return Err(CatalogError::UnknownActionPuzzle {
                    verb: action.verb.clone(),
                    puzzle: action.puzzle_id.clone(),
                });
            }
        }

        if let Some(help) = &catalog.help_puzzle {
            if !index.contains_key(help) {
                return Err(CatalogError::UnknownHelpPuzzle(help.clone()));
            }
        }

        Ok(Self {
            puzzles: catalog.puzzles,
            index,
            actions: catalog.actions,
            help_puzzle: catalog.help_puzzle,
        })
    }

    /// Puzzles in catalog order. Hidden puzzles only when `include_hidden`.
    ///
    /// This is the static listing; visibility that depends on progress is
    /// computed by the progress tracker.
    pub fn list(&self, include_hidden: bool) -> Vec<&Puzzle> {
        self.puzzles
            .iter()
            .filter(|p| include_hidden || !p.hidden)
            .collect()
    }

    /// Exact-id lookup.
    pub fn find(&self, id: &str) -> Option<&Puzzle> {
        self.index.get(id).and_then(|&i| self.puzzles.get(i))
    }

    /// All puzzles in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &Puzzle> {
        self.puzzles.iter()
    }

    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    /// Terminal actions in catalog order.
    pub fn actions(&self) -> &[TerminalAction] {
        &self.actions
    }

    /// The action handling `verb` with `args`, if any.
    pub fn action_for(&self, verb: &str, args: &[String]) -> Option<&TerminalAction> {
        self.actions.iter().find(|a| a.handles(verb, args))
    }

    /// Whether any action uses `verb`, regardless of arguments.
    pub fn has_verb(&self, verb: &str) -> bool {
        self.actions.iter().any(|a| a.verb.eq_ignore_ascii_case(verb))
    }

    /// Puzzle solved by running `help`.
    pub fn help_puzzle(&self) -> Option<&Puzzle> {
        self.help_puzzle.as_deref().and_then(|id| self.find(id))
    }
}

fn validate_puzzle(puzzle: &Puzzle) -> Result<(), CatalogError> {
    if puzzle.solutions.is_empty() {
        return Err(CatalogError::NoSolutions(puzzle.id.clone()));
    }
    if puzzle.solutions.iter().any(|s| s.trim().is_empty()) {
        return Err(CatalogError::EmptySolution(puzzle.id.clone()));
    }
    if puzzle.hints.is_empty() || puzzle.hints.len() > MAX_HINT_TIERS {
        return Err(CatalogError::HintTiers {
            id: puzzle.id.clone(),
            count: puzzle.hints.len(),
        });
    }
    Ok(())
}

/// Depth-first search over `depends_on` edges.
fn check_acyclic(puzzles: &[Puzzle], index: &HashMap<PuzzleId, usize>) -> Result<(), CatalogError> {
    fn visit(
        i: usize,
        puzzles: &[Puzzle],
        index: &HashMap<PuzzleId, usize>,
        done: &mut HashSet<usize>,
        path: &mut HashSet<usize>,
    ) -> Result<(), CatalogError> {
        if done.contains(&i) {
            return Ok(());
        }
        if !path.insert(i) {
            return Err(CatalogError::DependencyCycle(puzzles[i].id.clone()));
        }
        for dependency in &puzzles[i].depends_on {
            if let Some(&j) = index.get(dependency) {
                visit(j, puzzles, index, done, path)?;
            }
        }
        path.remove(&i);
        done.insert(i);
        Ok(())
    }

    let mut done = HashSet::new();
    let mut path = HashSet::new();
    for i in 0..puzzles.len() {
        visit(i, puzzles, index, &mut done, &mut path)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use hacklab_types::{ActionAttempt, Difficulty, PuzzleKind};

    use super::*;

    /// Minimal puzzle for tests.
    pub(crate) fn puzzle(id: &str, solution: &str) -> Puzzle {
        Puzzle {
            id: id.to_string(),
            title: id.to_uppercase(),
            short_hint: String::new(),
            description: String::new(),
            kind: PuzzleKind::TerminalTriggered,
            difficulty: Difficulty::Easy,
            case_insensitive: false,
            solutions: vec![solution.to_string()],
            hints: vec![format!("{id} hint 1"), format!("{id} hint 2"), format!("{id} hint 3")],
            badge_id: None,
            depends_on: vec![],
            hidden: false,
        }
    }

    fn catalog(puzzles: Vec<Puzzle>) -> Catalog {
        Catalog {
            help_puzzle: None,
            puzzles,
            actions: vec![],
        }
    }

    #[test]
    fn test_list_and_find() {
        let mut hidden = puzzle("ghost", "boo");
        hidden.hidden = true;
        let registry =
            PuzzleRegistry::new(catalog(vec![puzzle("p1", "FOO"), hidden])).expect("registry");

        let listed: Vec<&str> = registry.list(false).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(listed, vec!["p1"]);
        assert_eq!(registry.list(true).len(), 2);
        assert_eq!(registry.find("ghost").map(|p| p.title.as_str()), Some("GHOST"));
        assert!(registry.find("GHOST").is_none());
        assert!(registry.find("nope").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let result = PuzzleRegistry::new(catalog(vec![puzzle("p1", "a"), puzzle("p1", "b")]));
        assert!(matches!(result, Err(CatalogError::DuplicateId(id)) if id == "p1"));
    }

    #[test]
    fn test_invalid_solutions_and_hints_rejected() {
        let mut none = puzzle("p1", "a");
        none.solutions.clear();
        assert!(matches!(
            PuzzleRegistry::new(catalog(vec![none])),
            Err(CatalogError::NoSolutions(_))
        ));

        let mut blank = puzzle("p1", "a");
        blank.solutions.push("   ".to_string());
        assert!(matches!(
            PuzzleRegistry::new(catalog(vec![blank])),
            Err(CatalogError::EmptySolution(_))
        ));

        let mut many = puzzle("p1", "a");
        many.hints.push("fourth".to_string());
        assert!(matches!(
            PuzzleRegistry::new(catalog(vec![many])),
            Err(CatalogError::HintTiers { count: 4, .. })
        ));
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let mut p2 = puzzle("p2", "b");
        p2.depends_on = vec!["missing".to_string()];
        assert!(matches!(
            PuzzleRegistry::new(catalog(vec![p2])),
            Err(CatalogError::UnknownDependency { .. })
        ));
    }

    #[test]
    fn test_dependency_cycle_rejected() {
        let mut a = puzzle("a", "1");
        let mut b = puzzle("b", "2");
        a.depends_on = vec!["b".to_string()];
        b.depends_on = vec!["a".to_string()];
        assert!(matches!(
            PuzzleRegistry::new(catalog(vec![a, b])),
            Err(CatalogError::DependencyCycle(_))
        ));
    }

    #[test]
    fn test_action_lookup() {
        let mut cat = catalog(vec![puzzle("fs", "read")]);
        cat.actions.push(TerminalAction {
            verb: "cat".to_string(),
            argument: Some("secret.txt".to_string()),
            puzzle_id: "fs".to_string(),
            attempt: ActionAttempt::Fixed("read".to_string()),
            progress: vec![],
            success: vec![],
            denial: "no".to_string(),
        });
        let registry = PuzzleRegistry::new(cat).expect("registry");
        let args = vec!["secret.txt".to_string()];
        assert!(registry.action_for("cat", &args).is_some());
        assert!(registry.action_for("cat", &[]).is_none());
        assert!(registry.has_verb("CAT"));
        assert!(!registry.has_verb("dog"));
    }

    #[test]
    fn test_action_with_unknown_puzzle_rejected() {
        let mut cat = catalog(vec![]);
        cat.actions.push(TerminalAction {
            verb: "scan".to_string(),
            argument: None,
            puzzle_id: "scan".to_string(),
            attempt: ActionAttempt::Arguments,
            progress: vec![],
            success: vec![],
            denial: "no".to_string(),
        });
        assert!(matches!(
            PuzzleRegistry::new(cat),
            Err(CatalogError::UnknownActionPuzzle { .. })
        ));
    }

    #[test]
    fn test_catalog_from_toml() {
        let cat = Catalog::from_toml_str(
            r#"
            help_puzzle = "explorer"

            [[puzzle]]
            id = "explorer"
            title = "First Contact"
            kind = "terminal-triggered"
            difficulty = "easy"
            solutions = ["help"]
            hints = ["Every terminal has a manual."]

            [[puzzle]]
            id = "cookie"
            title = "Cookie Jar"
            kind = "stored-key-value"
            difficulty = "medium"
            solutions = ["access_level=root"]
            hints = ["Look at storage."]
            depends_on = ["explorer"]

            [[action]]
            verb = "unlock"
            puzzle_id = "cookie"
            attempt = { type = "arguments" }
            "#,
        )
        .expect("parse");
        let registry = PuzzleRegistry::new(cat).expect("registry");
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.help_puzzle().map(|p| p.id.as_str()), Some("explorer"));
        let cookie = registry.find("cookie").expect("cookie");
        assert_eq!(cookie.depends_on, vec!["explorer"]);
        assert!(!cookie.case_insensitive);
        assert_eq!(
            registry.actions()[0].attempt,
            ActionAttempt::Arguments
        );
    }
}
