//! Fixed ASCII layouts for special levels
//!
//! Glyphs:
//!
//! | glyph | meaning |
//! |-------|---------|
//! | `#` or space | solid wall |
//! | `.` | floor outside any room |
//! | `A`-`Z` | floor belonging to the room of that letter |
//! | `+` | floor with a door proposal |
//! | `?` | floor on a coin flip, wall otherwise |
//! | `@` | player start |
//! | `>` | stairs |
//!
//! The layout is centred on the map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::TemplateError;
use crate::rng::GameRng;

use super::cell::CellType;
use super::geom::Pos;
use super::grid::{Grid, Map};
use super::room::{Room, RoomId, RoomKind, register_room};

/// Arena guarded by two antechambers
const BOSS: &str = "\
###########################
#AAAAAAA#########BBBBBBBBB#
#AAAAAAA+.......+BBBBBBBBB#
#AAA@AAA#####.###BBBB>BBBB#
#AAAAAAA#####.###BBBBBBBBB#
#############?#############
#############.#############
#CCCCCCCCCCCC+CCCCCCCCCCCC#
#CCCCCCCCCCCCCCCCCCCCCCCCC#
###########################";

/// Cramped warren of small dens
const RATS: &str = "\
########################
#AAAAA+..?..+BBBBB######
#AAAAA#####.#BBBBB#DDDD#
#AA@AA#####.#BBBBB+DDDD#
#AAAAA#####+#BBBBB#DD>D#
###########CCCCC########
########################";

/// Names accepted by [`MapTemplate::builtin`]
pub const BUILTIN_TEMPLATES: [&str; 2] = ["boss", "rats"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Glyph {
    Wall,
    Floor,
    Room(u8),
    Door,
    Maybe,
    Start,
    Stairs,
}

impl Glyph {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            '#' | ' ' => Glyph::Wall,
            '.' => Glyph::Floor,
            'A'..='Z' => Glyph::Room(c as u8 - b'A'),
            '+' => Glyph::Door,
            '?' => Glyph::Maybe,
            '@' => Glyph::Start,
            '>' => Glyph::Stairs,
            _ => return None,
        })
    }
}

/// A parsed special level layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapTemplate {
    pub name: String,
    width: usize,
    height: usize,
    /// Row-major glyphs, short rows padded with wall
    glyphs: Vec<Glyph>,
}

/// What stamping a template placed on the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StampedTemplate {
    pub rooms: Vec<Room>,
    pub player_start: Option<Pos>,
    pub stairs: Option<Pos>,
}

impl MapTemplate {
    /// Parse a layout. Blank lines before and after the layout are ignored.
    /// At least one room letter is required.
    pub fn parse(name: &str, text: &str) -> Result<Self, TemplateError> {
        let lines: Vec<&str> = text.lines().map(str::trim_end).collect();
        let first = lines.iter().position(|l| !l.is_empty());
        let last = lines.iter().rposition(|l| !l.is_empty());
        let (Some(first), Some(last)) = (first, last) else {
            return Err(TemplateError::Empty);
        };
        let lines = &lines[first..=last];

        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        let height = lines.len();
        let mut glyphs = vec![Glyph::Wall; width * height];
        let (mut start, mut stairs) = (false, false);

        for (y, line) in lines.iter().enumerate() {
            for (x, c) in line.chars().enumerate() {
                let glyph = Glyph::from_char(c).ok_or(TemplateError::UnknownGlyph { glyph: c, x, y })?;
                let seen = match glyph {
                    Glyph::Start => &mut start,
                    Glyph::Stairs => &mut stairs,
                    _ => {
                        glyphs[y * width + x] = glyph;
                        continue;
                    }
                };
                if *seen {
                    return Err(TemplateError::DuplicateMarker(c));
                }
                *seen = true;
                glyphs[y * width + x] = glyph;
            }
        }
        if !glyphs.iter().any(|g| matches!(g, Glyph::Room(_))) {
            return Err(TemplateError::NoRooms);
        }

        Ok(Self {
            name: name.to_string(),
            width,
            height,
            glyphs,
        })
    }

    /// One of the built-in special levels
    pub fn builtin(name: &str) -> Option<Self> {
        let text = match name {
            "boss" => BOSS,
            "rats" => RATS,
            _ => return None,
        };
        Self::parse(name, text).ok()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// The layout must fit inside the map's border
    pub fn check_fits(&self, map_width: usize, map_height: usize) -> Result<(), TemplateError> {
        if self.width + 2 > map_width || self.height + 2 > map_height {
            return Err(TemplateError::TooLarge {
                width: self.width,
                height: self.height,
                map_width,
                map_height,
            });
        }
        Ok(())
    }

    /// Stamp the layout onto a solid map, creating one room per letter in
    /// alphabetical order
    pub fn stamp(
        &self,
        map: &mut Map,
        door_proposals: &mut Grid<bool>,
        rng: &mut GameRng,
    ) -> Result<StampedTemplate, TemplateError> {
        self.check_fits(map.width(), map.height())?;
        let ox = ((map.width() - self.width) / 2) as i32;
        let oy = ((map.height() - self.height) / 2) as i32;

        let mut members: BTreeMap<u8, Vec<Pos>> = BTreeMap::new();
        let mut stamped = StampedTemplate {
            rooms: Vec::new(),
            player_start: None,
            stairs: None,
        };

        for (i, &glyph) in self.glyphs.iter().enumerate() {
            let p = Pos::new(ox + (i % self.width) as i32, oy + (i / self.width) as i32);
            let floor = match glyph {
                Glyph::Wall => false,
                Glyph::Floor => true,
                Glyph::Room(letter) => {
                    members.entry(letter).or_default().push(p);
                    true
                }
                Glyph::Door => {
                    door_proposals.set(p, true);
                    true
                }
                Glyph::Maybe => rng.one_in(2),
                Glyph::Start => {
                    stamped.player_start = Some(p);
                    true
                }
                Glyph::Stairs => {
                    stamped.stairs = Some(p);
                    true
                }
            };
            if floor {
                map.set_type(p, CellType::Floor);
            }
        }

        for cells in members.into_values() {
            let room = Room::from_cells(RoomId(stamped.rooms.len()), RoomKind::Template, cells);
            register_room(map, &room);
            stamped.rooms.push(room);
        }
        Ok(stamped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_parse() {
        for name in BUILTIN_TEMPLATES {
            let template = MapTemplate::builtin(name).expect("built-in layout is valid");
            assert_eq!(template.name, name);
            assert!(template.check_fits(80, 22).is_ok());
        }
        assert!(MapTemplate::builtin("nope").is_none());
    }

    #[test]
    fn test_parse_pads_short_rows() {
        let template = MapTemplate::parse("t", "\n####\n#A\n####\n\n").expect("valid");
        assert_eq!((template.width(), template.height()), (4, 3));
        assert_eq!(template.glyphs[6], Glyph::Wall);
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(MapTemplate::parse("t", "\n  \n"), Err(TemplateError::Empty));
        assert_eq!(
            MapTemplate::parse("t", "###\n#x#\n###"),
            Err(TemplateError::UnknownGlyph { glyph: 'x', x: 1, y: 1 })
        );
        assert_eq!(
            MapTemplate::parse("t", "#@A@#"),
            Err(TemplateError::DuplicateMarker('@'))
        );
        assert_eq!(
            MapTemplate::parse("t", "#####\n#.+.#\n#@.>#\n#####"),
            Err(TemplateError::NoRooms)
        );
    }

    #[test]
    fn test_too_large() {
        let template = MapTemplate::parse("t", &format!("A{}", "#".repeat(29))).expect("valid");
        assert_eq!(
            template.check_fits(20, 10),
            Err(TemplateError::TooLarge {
                width: 30,
                height: 1,
                map_width: 20,
                map_height: 10
            })
        );
    }

    #[test]
    fn test_stamp_rats() {
        let template = MapTemplate::builtin("rats").expect("built-in");
        let mut map = Map::new(80, 22);
        let mut proposals = Grid::new(80, 22, false);
        let mut rng = GameRng::new(3);

        let stamped = template.stamp(&mut map, &mut proposals, &mut rng).expect("fits");

        assert_eq!(stamped.rooms.len(), 4);
        let sizes: Vec<usize> = stamped.rooms.iter().map(Room::area).collect();
        // A has the start cell and D the stairs cut out
        assert_eq!(sizes, vec![19, 20, 5, 11]);
        for (i, room) in stamped.rooms.iter().enumerate() {
            assert_eq!(room.id, RoomId(i));
            assert_eq!(room.kind, RoomKind::Template);
            assert!(room.cells.iter().all(|&p| map.room_at(p) == Some(room.id)));
        }

        let start = stamped.player_start.expect("layout has a start");
        assert!(map.is_passable(start));
        assert_eq!(map.room_at(start), None);
        assert!(stamped.stairs.is_some());

        let doors = proposals.iter().filter(|&(_, &d)| d).count();
        assert_eq!(doors, 4);
    }
}
