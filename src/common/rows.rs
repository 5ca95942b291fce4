/// Reverses the order of `row`-byte rows in place. A zero `row` is a no-op.
pub fn flip_rows(data: &mut [u8], row: usize) {
    if row == 0 {
        return;
    }
    let rows = data.len() / row;
    for top in 0..rows / 2 {
        let bottom = rows - 1 - top;
        let (upper, lower) = data.split_at_mut(bottom * row);
        upper[top * row..(top + 1) * row].swap_with_slice(&mut lower[..row]);
    }
}
