//! Built-in questions and event cards.

use crate::bank::{EventCard, EventEffect, Question, TierContent};

// ============================================================================
// Beginner
// ============================================================================

lazy_static::lazy_static! {
    pub static ref BEGINNER: TierContent = TierContent {
        questions: vec![
            Question::new(101, "What is 7 + 5?", ["10", "11", "12", "13"], "12"),
            Question::new(102, "Which planet is known as the Red Planet?", ["Venus", "Mars", "Jupiter", "Mercury"], "Mars")
                .with_explanation("Iron oxide on its surface gives Mars its red colour."),
            Question::new(103, "How many legs does a spider have?", ["6", "8", "10", "12"], "8"),
            Question::new(104, "What is the largest ocean on Earth?", ["Atlantic", "Indian", "Arctic", "Pacific"], "Pacific"),
            Question::new(105, "Which of these is a mammal?", ["Shark", "Dolphin", "Trout", "Octopus"], "Dolphin")
                .with_explanation("Dolphins breathe air and nurse their young."),
            Question::new(106, "What is 9 x 3?", ["18", "24", "27", "36"], "27"),
            Question::new(107, "What do plants take in from the air to make food?", ["Oxygen", "Nitrogen", "Carbon dioxide", "Helium"], "Carbon dioxide"),
            Question::new(108, "How many continents are there?", ["5", "6", "7", "8"], "7"),
            Question::new(109, "Which shape has three sides?", ["Square", "Triangle", "Pentagon", "Circle"], "Triangle"),
            Question::new(110, "What is frozen water called?", ["Steam", "Ice", "Fog", "Dew"], "Ice"),
        ],
        events: vec![
            EventCard::new(1, "A friendly breeze carries you forward 2 spaces.", EventEffect::Move, 2),
            EventCard::new(2, "You tripped over your shoelaces. Go back 2 spaces.", EventEffect::Move, -2),
            EventCard::new(3, "Lucky star! Roll again.", EventEffect::Reroll, 0),
            EventCard::new(4, "Nap time. You miss your next turn.", EventEffect::Skip, 0),
        ],
    };
}

// ============================================================================
// Intermediate
// ============================================================================

lazy_static::lazy_static! {
    pub static ref INTERMEDIATE: TierContent = TierContent {
        questions: vec![
            Question::new(201, "What is the chemical symbol for sodium?", ["So", "Sd", "Na", "Sn"], "Na")
                .with_points(3),
            Question::new(202, "What is the square root of 144?", ["10", "12", "14", "16"], "12")
                .with_points(3),
            Question::new(203, "Which organelle produces most of a cell's energy?", ["Nucleus", "Ribosome", "Mitochondrion", "Vacuole"], "Mitochondrion")
                .with_points(3)
                .with_explanation("Mitochondria generate ATP through cellular respiration."),
            Question::new(204, "Who wrote 'Romeo and Juliet'?", ["Charles Dickens", "William Shakespeare", "Jane Austen", "Mark Twain"], "William Shakespeare")
                .with_points(3),
            Question::new(205, "What is 15% of 200?", ["15", "20", "30", "45"], "30")
                .with_points(3),
            Question::new(206, "Which gas makes up most of Earth's atmosphere?", ["Oxygen", "Nitrogen", "Argon", "Carbon dioxide"], "Nitrogen")
                .with_points(3)
                .with_explanation("Nitrogen is about 78% of the atmosphere by volume."),
            Question::new(207, "What is the capital of Canada?", ["Toronto", "Vancouver", "Montreal", "Ottawa"], "Ottawa")
                .with_points(3),
            Question::new(208, "How many sides does a hexagon have?", ["5", "6", "7", "8"], "6")
                .with_points(3),
        ],
        events: vec![
            EventCard::new(11, "Shortcut through the park! Move ahead 3 spaces.", EventEffect::Move, 3),
            EventCard::new(12, "Detour ahead. Go back 3 spaces.", EventEffect::Move, -3),
            EventCard::new(13, "Second wind! Roll again.", EventEffect::Reroll, 0),
            EventCard::new(14, "Library fine overdue. You miss your next turn.", EventEffect::Skip, 0),
        ],
    };
}

// ============================================================================
// Expert
// ============================================================================

lazy_static::lazy_static! {
    pub static ref EXPERT: TierContent = TierContent {
        questions: vec![
            Question::new(301, "What is the derivative of sin(x)?", ["cos(x)", "-cos(x)", "tan(x)", "-sin(x)"], "cos(x)")
                .with_points(5),
            Question::new(302, "Which particle has no electric charge?", ["Proton", "Electron", "Neutron", "Positron"], "Neutron")
                .with_points(5),
            Question::new(303, "In what year did the Berlin Wall fall?", ["1987", "1989", "1991", "1993"], "1989")
                .with_points(5),
            Question::new(304, "What is the time complexity of binary search?", ["O(1)", "O(log n)", "O(n)", "O(n log n)"], "O(log n)")
                .with_points(5)
                .with_explanation("Each comparison halves the remaining search space."),
            Question::new(305, "Which element has atomic number 26?", ["Cobalt", "Nickel", "Iron", "Copper"], "Iron")
                .with_points(5),
            Question::new(306, "What is the sum of the interior angles of a pentagon?", ["360°", "450°", "540°", "720°"], "540°")
                .with_points(5)
                .with_explanation("(n - 2) x 180° with n = 5."),
            Question::new(307, "Which scientist proposed the uncertainty principle?", ["Bohr", "Heisenberg", "Schrödinger", "Dirac"], "Heisenberg")
                .with_points(5),
            Question::new(308, "What is the smallest prime number greater than 50?", ["51", "53", "57", "59"], "53")
                .with_points(5),
        ],
        events: vec![
            EventCard::new(21, "Eureka moment! Leap ahead 5 spaces.", EventEffect::Move, 5),
            EventCard::new(22, "Peer review rejected your paper. Go back 4 spaces.", EventEffect::Move, -4),
            EventCard::new(23, "Grant approved! Roll again.", EventEffect::Reroll, 0),
            EventCard::new(24, "Conference travel. You miss your next turn.", EventEffect::Skip, 0),
        ],
    };
}
