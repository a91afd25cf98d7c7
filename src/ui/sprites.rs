use crate::state::AvatarImage;

pub const SPRITE_HEIGHT: usize = 9;

const IDLE: [&str; SPRITE_HEIGHT] = [
    "     .-----------.     ",
    "    /             \\    ",
    "   |   .--.  .--.  |   ",
    "   |   |()|  |()|  |   ",
    "   |   '--'  '--'  |   ",
    "   |               |   ",
    "   |    .-----.    |   ",
    "    \\             /    ",
    "     '-----------'     ",
];

const BLINK: [&str; SPRITE_HEIGHT] = [
    "     .-----------.     ",
    "    /             \\    ",
    "   |               |   ",
    "   |   ----  ----  |   ",
    "   |               |   ",
    "   |               |   ",
    "   |    .-----.    |   ",
    "    \\             /    ",
    "     '-----------'     ",
];

const THINK: [&str; SPRITE_HEIGHT] = [
    "     .-----------.   o ",
    "    /             \\ o  ",
    "   |   .--.  .--.  |   ",
    "   |   | o|  | o|  |   ",
    "   |   '--'  '--'  |   ",
    "   |               |   ",
    "   |     .---.     |   ",
    "    \\             /    ",
    "     '-----------'     ",
];

const THINK_BLINK: [&str; SPRITE_HEIGHT] = [
    "     .-----------.   o ",
    "    /             \\ o  ",
    "   |               |   ",
    "   |   ----  ----  |   ",
    "   |               |   ",
    "   |               |   ",
    "   |     .---.     |   ",
    "    \\             /    ",
    "     '-----------'     ",
];

const TALK: [&str; SPRITE_HEIGHT] = [
    "     .-----------.     ",
    "    /             \\    ",
    "   |   .--.  .--.  |   ",
    "   |   |()|  |()|  |   ",
    "   |   '--'  '--'  |   ",
    "   |    _______    |   ",
    "   |   |       |   |   ",
    "    \\  '-------'  /    ",
    "     '-----------'     ",
];

/// ASCII frame drawn for an avatar image.
pub fn sprite(image: AvatarImage) -> &'static [&'static str] {
    match image {
        AvatarImage::Idle => &IDLE,
        AvatarImage::Blink => &BLINK,
        AvatarImage::Think => &THINK,
        AvatarImage::ThinkBlink => &THINK_BLINK,
        AvatarImage::Talk => &TALK,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ui::input_metrics::display_width;

    const ALL: [AvatarImage; 5] = [
        AvatarImage::Idle,
        AvatarImage::Blink,
        AvatarImage::Think,
        AvatarImage::ThinkBlink,
        AvatarImage::Talk,
    ];

    #[test]
    fn sprites_share_one_frame_size() {
        let width = display_width(sprite(AvatarImage::Idle)[0]);
        for image in ALL {
            let rows = sprite(image);
            assert_eq!(rows.len(), SPRITE_HEIGHT, "{image:?}");
            assert!(rows.iter().all(|row| display_width(row) == width), "{image:?}");
        }
    }

    #[test]
    fn every_image_has_a_distinct_frame() {
        for (i, a) in ALL.iter().enumerate() {
            for b in &ALL[i + 1..] {
                assert_ne!(sprite(*a), sprite(*b), "{a:?} vs {b:?}");
            }
        }
    }
}
