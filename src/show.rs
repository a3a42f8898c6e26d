use itertools::Itertools;

use crate::automaton::{Label, State};
use crate::math::OrderedSet;

/// This method should display the time in a sensible format. If it is less than a second, it should
/// only display the milliseconds and microseconds. If it is less than a minute, it should display
/// the seconds and milliseconds. Anything longer is shown in minutes and seconds.
pub fn show_duration(duration: std::time::Duration) -> String {
    let ms = duration.as_millis();
    let us = duration.as_micros();
    let s = duration.as_secs();
    let m = s / 60;

    if m > 0 {
        format!("{}m {}s", m, s % 60)
    } else if s > 0 {
        format!("{}s {}ms", s, ms % 1000)
    } else if ms > 0 {
        format!("{}ms {}us", ms, us % 1000)
    } else {
        format!("{}us", us)
    }
}

/// Helper trait which can be used to display states, transitions and such.
pub trait Show {
    /// Returns a human readable representation of `self`, for a state that should be
    /// for example q0, q1, q2, ... and for a transition (q0, a, q1) it should be (q0, a, q1).
    /// Just use something that makes sense. This is mainly used for logging.
    fn show(&self) -> String;
}

impl Show for State {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for Label {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for char {
    fn show(&self) -> String {
        self.to_string()
    }
}

impl Show for OrderedSet<State> {
    fn show(&self) -> String {
        if self.is_empty() {
            "∅".to_string()
        } else {
            format!("{{{}}}", self.iter().map(Show::show).join(", "))
        }
    }
}

impl Show for [char] {
    fn show(&self) -> String {
        if self.is_empty() {
            "ε".to_string()
        } else {
            format!("\"{}\"", self.iter().collect::<String>())
        }
    }
}

impl Show for Vec<char> {
    fn show(&self) -> String {
        self.as_slice().show()
    }
}

impl Show for (State, Label, State) {
    fn show(&self) -> String {
        format!("({}, {}, {})", self.0, self.1, self.2)
    }
}

impl<S: Show + ?Sized> Show for &S {
    fn show(&self) -> String {
        S::show(*self)
    }
}
