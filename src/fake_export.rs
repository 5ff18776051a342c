use chrono::{Duration as ChronoDuration, Local};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::export_block::{HOME_MARKER, TEAM_EVENTS_MARKER, VISITORS_MARKER};

const HEADER: &str = "No.,Player Name,Time,Points,2PM,2PA,3PM,3PA,FTM,FTA,Off Reb,Def Reb,\
                      Assists,Steal,Block,Deflection,T-over,Fouls,Steps,+/-,Eff,Custom 2";

const ROSTER: [(&str, u8); 11] = [
    ("Rossi M.", 4),
    ("Bianchi L.", 5),
    ("Colombo A.", 7),
    ("Ferrari G.", 8),
    ("Galli S.", 9),
    ("Conti R.", 10),
    ("Ricci F.", 11),
    ("Marino D.", 12),
    ("Greco P.", 13),
    ("Bruno T.", 14),
    ("Villa N.", 15),
];

const OPPONENTS: [&str; 6] = [
    "Rho Basket",
    "Pall. Lainate",
    "Bollate Bulls",
    "Garbagnate BC",
    "Senago Eagles",
    "Novate Stars",
];

/// A HoopStats-style export with a block for `team` and one for a random
/// opponent. One or two players sit out with `0:00`.
pub fn demo_export<R: Rng>(rng: &mut R, team: &str) -> String {
    let opponent = OPPONENTS.choose(rng).copied().unwrap_or("Opponent");
    let team_at_home = rng.gen_bool(0.5);
    let date = Local::now().date_naive() - ChronoDuration::days(rng.gen_range(1..120));
    let (home, away) = if team_at_home {
        (team, opponent)
    } else {
        (opponent, team)
    };

    let mut lines = vec![
        "HoopStats Game Report".to_string(),
        format!("{home} vs {away}"),
        format!("{},{} Arena,Final", date.format("%d/%m/%Y"), home),
    ];

    let benched = rng.gen_range(1..=2);
    lines.push(format!("{HOME_MARKER}{home}"));
    lines.push(HEADER.to_string());
    lines.extend(player_lines(rng, home == team, benched));
    lines.push(format!("{TEAM_EVENTS_MARKER},Timeouts,2"));
    lines.push(format!("{VISITORS_MARKER}{away}"));
    lines.push(HEADER.to_string());
    lines.extend(player_lines(rng, away == team, benched));
    lines.push(format!("{TEAM_EVENTS_MARKER},Timeouts,3"));
    lines.join("\n")
}

fn player_lines<R: Rng>(rng: &mut R, own_roster: bool, benched: usize) -> Vec<String> {
    let mut out = Vec::new();
    for (idx, (name, number)) in ROSTER.iter().enumerate() {
        let name = if own_roster {
            (*name).to_string()
        } else {
            format!("Opp {}", idx + 1)
        };
        if idx + benched >= ROSTER.len() {
            out.push(format!(
                "{number},{name},0:00,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0,"
            ));
            continue;
        }

        let minutes = rng.gen_range(3..28);
        let seconds = rng.gen_range(0..60);
        let two_att = rng.gen_range(0..10);
        let two_made = rng.gen_range(0..=two_att);
        let three_att = rng.gen_range(0..5);
        let three_made = rng.gen_range(0..=three_att);
        let ft_att = rng.gen_range(0..6);
        let ft_made = rng.gen_range(0..=ft_att);
        let points = two_made * 2 + three_made * 3 + ft_made;
        let plus_minus = rng.gen_range(-15..=15);
        let eff = rng.gen_range(-4..=20);
        // Occasionally the tool leaves a trailing field after Custom 2.
        let trailing = if rng.gen_bool(0.2) { ",," } else { "" };
        out.push(format!(
            "{number},{name},{minutes}:{seconds:02},{points},{two_made},{two_att},{three_made},\
             {three_att},{ft_made},{ft_att},{},{},{},{},{},{},{},{},{},{plus_minus},{eff},{trailing}",
            rng.gen_range(0..4),
            rng.gen_range(0..7),
            rng.gen_range(0..5),
            rng.gen_range(0..4),
            rng.gen_range(0..2),
            rng.gen_range(0..4),
            rng.gen_range(0..4),
            rng.gen_range(0..5),
            rng.gen_range(0..2),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export_block::{extract_team_block, split_export};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn demo_export_contains_team_block() {
        let mut rng = StdRng::seed_from_u64(7);
        let raw = demo_export(&mut rng, "SG Arese U15");
        let lines = split_export(raw.as_bytes()).unwrap();
        let block = extract_team_block(&lines, "SG Arese U15")
            .unwrap()
            .expect("team block");
        assert_eq!(block.data_lines().len(), ROSTER.len());
        assert!(block.match_name.contains("SG Arese U15"));
    }
}
