//! Terminal dispatch table.

use hacklab_types::TerminalAction;
use tracing::debug;

use super::parser::ParsedCommand;
use super::Shared;
use crate::scope::TaskScope;

const HELP: &[&str] = &[
    "available commands:",
    "  help                     show this list",
    "  clear                    clear the screen",
    "  badge list               show earned badges",
    "  status                   show puzzle progress",
    "  puzzles                  list known puzzles",
    "  hints <id>               show unlocked hints",
    "  submit <id> <answer>     submit a puzzle answer",
    "  unlock hint <n>          confirm a hint unlock",
    "some commands are not listed. explore.",
];

/// Run one parsed command. Returns `false` if the terminal was unmounted
/// while the command was suspended.
pub(super) async fn dispatch(shared: &Shared, scope: &TaskScope, cmd: &ParsedCommand) -> bool {
    match cmd.verb.as_str() {
        "help" => help(shared),
        "clear" => shared.clear(),
        "badge" => badge(shared, cmd),
        "status" => status(shared),
        "puzzles" => puzzles(shared),
        "hints" => hints(shared, cmd),
        "submit" => submit(shared, cmd),
        "unlock" if cmd.arg_lower(0).as_deref() == Some("hint") => unlock_hint(shared, cmd),
        verb => match shared.registry.action_for(verb, &cmd.args) {
            Some(action) => return run_action(shared, scope, action, cmd).await,
            None if shared.registry.has_verb(verb) => {
                match cmd.args.first() {
                    Some(target) => shared.push_line(format!("{verb}: {target}: no such target")),
                    None => shared.push_line(format!("{verb}: missing operand")),
                }
                shared.pulse();
            }
            None => {
                shared.push_line(format!(
                    "command not found: {verb}. type 'help' for a list of commands."
                ));
                shared.pulse();
            }
        },
    }
    true
}

fn help(shared: &Shared) {
    for line in HELP {
        shared.push_line(*line);
    }
    if let Some(puzzle) = shared.registry.help_puzzle() {
        if shared.progress.mark_solved(&puzzle.id) {
            shared.push_line(format!("[+] badge earned: {}", puzzle.badge()));
        }
    }
}

fn badge(shared: &Shared, cmd: &ParsedCommand) {
    if cmd.arg_lower(0).as_deref() != Some("list") || cmd.args.len() > 1 {
        shared.push_line("usage: badge list");
        return;
    }
    let badges = shared.progress.badges();
    if badges.is_empty() {
        shared.push_line("no badges yet. go break something.");
        return;
    }
    shared.push_line(format!("badges ({}):", badges.len()));
    for badge in badges {
        shared.push_line(format!("  * {badge}"));
    }
}

fn status(shared: &Shared) {
    let snapshot = shared.progress.snapshot();
    shared.push_line(format!(
        "progress: {}/{} puzzles solved",
        snapshot.solved, snapshot.total
    ));
    if snapshot.reveal_all {
        shared.push_line("all hidden puzzles revealed.");
    }
}

fn puzzles(shared: &Shared) {
    for puzzle in shared.progress.visible_puzzles() {
        let mark = if shared.progress.is_solved(&puzzle.id) {
            'x'
        } else {
            ' '
        };
        shared.push_line(format!("[{mark}] {:<12} {}", puzzle.id, puzzle.title));
    }
}

fn hints(shared: &Shared, cmd: &ParsedCommand) {
    let Some(id) = cmd.args.first() else {
        shared.push_line("usage: hints <puzzle-id>");
        return;
    };
    let Some(puzzle) = shared.registry.find(id) else {
        shared.push_line(format!("no such puzzle: {id}"));
        return;
    };
    let usage = shared.progress.hint_usage(&puzzle.id);
    if usage == 0 {
        shared.push_line(format!("no hints unlocked for {id}."));
        return;
    }
    for hint in puzzle.hint_tiers().into_iter().filter(|h| h.tier <= usage) {
        shared.push_line(format!("hint {}: {}", hint.tier, hint.text));
    }
}

fn submit(shared: &Shared, cmd: &ParsedCommand) {
    let answer = cmd.remainder(1);
    let Some(id) = cmd.args.first().filter(|_| !answer.is_empty()) else {
        shared.push_line("usage: submit <puzzle-id> <answer>");
        return;
    };
    let outcome = shared.checker.check(id, answer);
    shared.push_line(outcome.message);
    if !outcome.accepted {
        shared.pulse();
    }
}

fn unlock_hint(shared: &Shared, cmd: &ParsedCommand) {
    match cmd.args.get(1).and_then(|n| n.parse::<u32>().ok()) {
        Some(tier) => shared.push_line(format!("[*] unlock request relayed: hint {tier}")),
        None => shared.push_line("usage: unlock hint <n>"),
    }
}

async fn run_action(
    shared: &Shared,
    scope: &TaskScope,
    action: &TerminalAction,
    cmd: &ParsedCommand,
) -> bool {
    let Some(puzzle) = shared.registry.find(&action.puzzle_id) else {
        return true;
    };

    if !shared.progress.dependencies_met(puzzle) {
        let missing: Vec<&str> = puzzle
            .depends_on
            .iter()
            .filter(|dep| !shared.progress.is_solved(dep))
            .map(String::as_str)
            .collect();
        debug!(verb = %action.verb, puzzle_id = %puzzle.id, "action gated");
        shared.push_line(format!(
            "[!] {}: prerequisites missing ({})",
            action.verb,
            missing.join(", ")
        ));
        return true;
    }

    if shared.progress.is_solved(&puzzle.id) {
        shared.push_line(format!("[i] {}: already done. nothing new here.", action.verb));
        return true;
    }

    if !scope.sleep(shared.config.action_delay()).await {
        return false;
    }
    for line in &action.progress {
        shared.push_line(line.as_str());
    }

    let outcome = shared.checker.check(&puzzle.id, &action.attempt_for(&cmd.args));
    if outcome.accepted {
        for line in &action.success {
            shared.push_line(line.as_str());
        }
        let newly_solved = outcome.newly_solved;
        shared.push_line(outcome.message);
        if newly_solved {
            shared.push_line(format!("[+] badge earned: {}", puzzle.badge()));
        }
    } else {
        shared.push_line(action.denial.as_str());
        shared.pulse();
    }
    true
}
