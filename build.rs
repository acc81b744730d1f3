//! Build script for the Magic Booth Tauri app.

fn main() {
    tauri_build::build();
}
