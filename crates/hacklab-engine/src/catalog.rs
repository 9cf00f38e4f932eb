//! Built-in portfolio catalog.

use hacklab_types::{ActionAttempt, Difficulty, Puzzle, PuzzleKind, TerminalAction};

use crate::registry::Catalog;

/// The puzzles shipped with the portfolio site.
pub fn default_catalog() -> Catalog {
    Catalog {
        help_puzzle: Some("explorer".to_string()),
        puzzles: vec![
            Puzzle {
                id: "explorer".to_string(),
                title: "First Contact".to_string(),
                short_hint: "Every shell has a manual.".to_string(),
                description: "Find out what this terminal can do.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Easy,
                case_insensitive: true,
                solutions: strings(&["help"]),
                hints: strings(&[
                    "The terminal on the home page accepts commands.",
                    "Ask it for help.",
                ]),
                badge_id: None,
                depends_on: vec![],
                hidden: false,
            },
            Puzzle {
                id: "scan".to_string(),
                title: "Port Sweep".to_string(),
                short_hint: "What is listening?".to_string(),
                description: "Map the open ports of the portfolio host.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Easy,
                case_insensitive: true,
                solutions: strings(&["ports: 22,80,443"]),
                hints: strings(&[
                    "Recon comes before exploitation.",
                    "Network people like to scan things.",
                    "Type `scan` in the terminal.",
                ]),
                badge_id: Some("netrunner".to_string()),
                depends_on: vec![],
                hidden: false,
            },
            Puzzle {
                id: "probe".to_string(),
                title: "Banner Grab".to_string(),
                short_hint: "Open ports talk if you ask.".to_string(),
                description: "Identify the web server behind port 80.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Medium,
                case_insensitive: true,
                solutions: strings(&["banner: portfolio-httpd/1.0"]),
                hints: strings(&[
                    "You need to know which ports are open first.",
                    "Poke the open service.",
                    "Type `probe` after a successful scan.",
                ]),
                badge_id: None,
                depends_on: strings(&["scan"]),
                hidden: false,
            },
            Puzzle {
                id: "awakening".to_string(),
                title: "Awakening".to_string(),
                short_hint: "Follow the white rabbit.".to_string(),
                description: "Something stirs once the host is mapped.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Secret,
                case_insensitive: true,
                solutions: strings(&["wake up, neo"]),
                hints: strings(&[
                    "It only appears after recon and probing.",
                    "The lab wants you to wake up.",
                    "Type `awakening`.",
                ]),
                badge_id: Some("the_one".to_string()),
                depends_on: strings(&["scan", "probe"]),
                hidden: true,
            },
            Puzzle {
                id: "cookie".to_string(),
                title: "Cookie Jar".to_string(),
                short_hint: "Grant yourself a promotion.".to_string(),
                description: "The site trusts whatever it finds in local storage.".to_string(),
                kind: PuzzleKind::StoredKeyValue,
                difficulty: Difficulty::Medium,
                case_insensitive: false,
                solutions: strings(&["access_level=root"]),
                hints: strings(&[
                    "Client-side state is never trustworthy.",
                    "Look for an access level.",
                    "Store access_level=root.",
                ]),
                badge_id: None,
                depends_on: vec![],
                hidden: false,
            },
            Puzzle {
                id: "backdoor".to_string(),
                title: "Off The Map".to_string(),
                short_hint: "Not every page is in the navigation.".to_string(),
                description: "Find the route the sitemap forgot.".to_string(),
                kind: PuzzleKind::HiddenRoute,
                difficulty: Difficulty::Hard,
                case_insensitive: true,
                solutions: strings(&["/lab/backdoor"]),
                hints: strings(&[
                    "Crawlers are told what not to visit.",
                    "Read robots.txt.",
                ]),
                badge_id: None,
                depends_on: vec![],
                hidden: false,
            },
            Puzzle {
                id: "console".to_string(),
                title: "Console Whisper".to_string(),
                short_hint: "Developers leave notes.".to_string(),
                description: "A message is printed where only developers look.".to_string(),
                kind: PuzzleKind::ConsolePrinted,
                difficulty: Difficulty::Easy,
                case_insensitive: true,
                solutions: strings(&["hello from the other side"]),
                hints: strings(&[
                    "Open the developer tools.",
                    "Check the console tab.",
                ]),
                badge_id: None,
                depends_on: vec![],
                hidden: false,
            },
            Puzzle {
                id: "listing".to_string(),
                title: "Directory Walk".to_string(),
                short_hint: "Look around.".to_string(),
                description: "List the lab's working directory.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Easy,
                case_insensitive: false,
                solutions: strings(&["readme.txt secret.txt"]),
                hints: strings(&["Unix people list things with two letters."]),
                badge_id: None,
                depends_on: vec![],
                hidden: false,
            },
            Puzzle {
                id: "secret_file".to_string(),
                title: "Need To Know".to_string(),
                short_hint: "Read what you found.".to_string(),
                description: "Print the contents of the secret file.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Medium,
                case_insensitive: false,
                solutions: strings(&["vault code located"]),
                hints: strings(&[
                    "You need to know the file name first.",
                    "Concatenate it to the screen.",
                ]),
                badge_id: None,
                depends_on: strings(&["listing"]),
                hidden: false,
            },
            Puzzle {
                id: "vault".to_string(),
                title: "The Vault".to_string(),
                short_hint: "Codes are meant to be used.".to_string(),
                description: "Open the vault with the code from the secret file.".to_string(),
                kind: PuzzleKind::TerminalTriggered,
                difficulty: Difficulty::Hard,
                case_insensitive: true,
                solutions: strings(&["0xc0ffee"]),
                hints: strings(&[
                    "The secret file mentions a code.",
                    "Hex, and caffeinated.",
                    "unlock 0xC0FFEE",
                ]),
                badge_id: Some("safecracker".to_string()),
                depends_on: strings(&["secret_file"]),
                hidden: false,
            },
            Puzzle {
                id: "ghost".to_string(),
                title: "Ghost In The Shell".to_string(),
                short_hint: "Only the thorough will see it.".to_string(),
                description: "Appears once everything else is done.".to_string(),
                kind: PuzzleKind::ConsolePrinted,
                difficulty: Difficulty::Secret,
                case_insensitive: true,
                solutions: strings(&["boo"]),
                hints: strings(&[
                    "Finish every visible puzzle.",
                    "Ghosts say one word.",
                ]),
                badge_id: None,
                depends_on: vec![],
                hidden: true,
            },
        ],
        actions: vec![
            TerminalAction {
                verb: "scan".to_string(),
                argument: None,
                puzzle_id: "scan".to_string(),
                attempt: ActionAttempt::Fixed("ports: 22,80,443".to_string()),
                progress: strings(&[
                    "[*] sweeping 10.0.0.0/24 ...",
                    "[+] 22/tcp   open  ssh",
                    "[+] 80/tcp   open  http",
                    "[+] 443/tcp  open  https",
                ]),
                success: strings(&["[+] recon complete. try `probe` next."]),
                denial: "[x] scan blocked by firewall".to_string(),
            },
            TerminalAction {
                verb: "probe".to_string(),
                argument: None,
                puzzle_id: "probe".to_string(),
                attempt: ActionAttempt::Fixed("banner: portfolio-httpd/1.0".to_string()),
                progress: strings(&[
                    "[*] connecting to 10.0.0.7:80 ...",
                    "[+] HTTP/1.1 200 OK",
                    "[+] Server: portfolio-httpd/1.0",
                ]),
                success: strings(&["[+] service fingerprinted."]),
                denial: "[x] probe dropped".to_string(),
            },
            TerminalAction {
                verb: "awakening".to_string(),
                argument: None,
                puzzle_id: "awakening".to_string(),
                attempt: ActionAttempt::Fixed("wake up, neo".to_string()),
                progress: strings(&[
                    "the matrix has you...",
                    "follow the white rabbit.",
                ]),
                success: strings(&["knock, knock."]),
                denial: "[x] the signal fades".to_string(),
            },
            TerminalAction {
                verb: "ls".to_string(),
                argument: None,
                puzzle_id: "listing".to_string(),
                attempt: ActionAttempt::Fixed("readme.txt secret.txt".to_string()),
                progress: strings(&["readme.txt  secret.txt"]),
                success: vec![],
                denial: "ls: permission denied".to_string(),
            },
            TerminalAction {
                verb: "cat".to_string(),
                argument: Some("secret.txt".to_string()),
                puzzle_id: "secret_file".to_string(),
                attempt: ActionAttempt::Fixed("vault code located".to_string()),
                progress: strings(&[
                    "-- internal memo --",
                    "the vault code is 0xC0FFEE. do not share.",
                ]),
                success: vec![],
                denial: "cat: secret.txt: permission denied".to_string(),
            },
            TerminalAction {
                verb: "unlock".to_string(),
                argument: None,
                puzzle_id: "vault".to_string(),
                attempt: ActionAttempt::Arguments,
                progress: strings(&["[*] spinning tumblers ..."]),
                success: strings(&["[+] vault open. nice work."]),
                denial: "[x] wrong code. the vault stays shut.".to_string(),
            },
        ],
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
