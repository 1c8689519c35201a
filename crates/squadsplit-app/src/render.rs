// Plain-text share format for generated teams.

use std::fmt::Write;

use squadsplit_core::{Lineup, LockMap, Participant, Side, SplitQuality, Team};

/// Render a lineup for pasting into a group chat.
///
/// The first member of each team is its captain. Locked participants are
/// marked so the group can see who was kept in place.
pub fn render_lineup(group_name: &str, lineup: &Lineup, locks: &LockMap, max_diff: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{group_name}");
    let _ = writeln!(out);

    for side in [Side::A, Side::B] {
        render_team(&mut out, side, lineup.teams.team(side), locks);
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "Score difference: {}", lineup.diff);
    if lineup.quality == SplitQuality::BestEffort {
        let _ = writeln!(
            out,
            "Note: best effort, no split within a difference of {max_diff} was found."
        );
    }
    out
}

fn render_team(out: &mut String, side: Side, team: &Team, locks: &LockMap) {
    let _ = writeln!(out, "Team {} (total {})", side, team.total_score());
    for (i, member) in team.iter().enumerate() {
        let mut line = format!("  {}", member_label(member));
        if i == 0 {
            line.push_str(" (C)");
        }
        if locks.is_locked(&member.id) {
            line.push_str(" [locked]");
        }
        let _ = writeln!(out, "{line}");
    }
}

fn member_label(member: &Participant) -> String {
    match member.nickname.as_deref() {
        Some(nick) if nick != member.name => format!("{} \"{}\"", member.name, nick),
        _ => member.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use squadsplit_core::{ParticipantId, TeamPair};

    fn lineup(max_diff: u64) -> Lineup {
        let mut bea = Participant::new("p2", "Bea", 4);
        bea.nickname = Some("Bee".into());
        let a = Team::new(vec![Participant::new("p1", "Alex", 9), bea]);
        let b = Team::new(vec![
            Participant::new("p3", "Carlos", 7),
            Participant::new("p4", "Dana", 1),
        ]);
        Lineup::new(TeamPair::new(a, b), max_diff)
    }

    #[test]
    fn marks_captain_totals_and_nicknames() {
        let text = render_lineup("Sunday Five", &lineup(5), &LockMap::new(), 5);
        let expected = "\
Sunday Five

Team A (total 13)
  Alex (C)
  Bea \"Bee\"

Team B (total 8)
  Carlos (C)
  Dana

Score difference: 5
";
        assert_eq!(text, expected);
    }

    #[test]
    fn marks_locks_and_best_effort() {
        let locks: LockMap = [ParticipantId::new("p4")].into_iter().collect();
        let text = render_lineup("Sunday Five", &lineup(2), &locks, 2);
        assert!(text.contains("  Dana [locked]\n"));
        assert!(text.contains("Note: best effort"));
        assert!(text.contains("difference of 2"));
    }
}
