fn main() {
    // 编译 Slint UI
    slint_build::compile("ui/main.slint").unwrap();
}
