//! Prompt assembly for storyboard panels and animation.

/// Scene prompt for panel `index` (0-based) of a `total`-panel storyboard.
#[must_use]
pub fn panel_prompt(idea: &str, index: usize, total: usize) -> String {
    let beat = match (index, total) {
        (0, _) => "opening shot establishing the setting",
        (i, t) if i + 1 == t => "closing shot resolving the story",
        _ => "mid-story shot advancing the action",
    };
    format!(
        "Storyboard panel {panel} of {total}, {beat}. Story idea: {idea}. \
         Cinematic framing, consistent characters and style across panels.",
        panel = index + 1,
    )
}

/// Motion prompt for animating a panel image into a short clip.
#[must_use]
pub fn motion_prompt(scene_prompt: &str, motion: &str) -> String {
    format!("Animate this panel: {motion}. Scene context: {scene_prompt}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_and_last_panels_get_their_beats() {
        let first = panel_prompt("a fox learns to fly", 0, 4);
        let last = panel_prompt("a fox learns to fly", 3, 4);
        assert!(first.contains("panel 1 of 4"));
        assert!(first.contains("opening shot"));
        assert!(last.contains("panel 4 of 4"));
        assert!(last.contains("closing shot"));
    }

    #[test]
    fn single_panel_is_an_opening_shot() {
        assert!(panel_prompt("x", 0, 1).contains("opening shot"));
    }
}
