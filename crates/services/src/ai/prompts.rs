//! Prompt text sent to the tutor. Nothing outside `ai` formats prompts.

use exam_core::model::{Question, Subject, option_letter};

/// System instruction shared by every call.
pub const PERSONA: &str = "\
Anda adalah AI Master Tutor SNBT Profesional.
PERATURAN PENULISAN MATEMATIKA (WAJIB DIPATUHI):
1. DILARANG KERAS MENGGUNAKAN TANDA DOLAR ($) untuk rumus. CONTOH SALAH: $X^2 = 49$.
2. DILARANG MENGGUNAKAN BACKSLASH (\\) untuk perintah LaTeX.
3. WAJIB MENGGUNAKAN SIMBOL UNICODE STANDAR (Simbol yang bisa diketik di HP/Laptop biasa).
   - Pangkat: Gunakan tanda caret ^ atau superscript unicode (contoh: x^2 atau x²).
   - Akar Kuadrat: Gunakan simbol √ (contoh: √49 = 7).
   - Pi: Gunakan simbol π.
   - Tidak Sama Dengan: Gunakan ≠.
   - Lebih Dari Sama Dengan: Gunakan ≥.
   - Kurang Dari Sama Dengan: Gunakan ≤.
   - Derajat: Gunakan °.

CONTOH PENULISAN YANG BENAR:
- Jika X² = 49 dan Y = 7, maka hubungan antara |X| dan Y adalah ...
- Rumus luas lingkaran adalah L = π × r².
- Nilai dari √144 adalah 12.

Jelaskan materi dengan bahasa Indonesia yang jelas, cepat, dan to-the-point.";

/// Opening message when the student asks the tutor about the question on screen.
pub const WALKTHROUGH_OPENING: &str =
    "Tolong jelaskan solusi dari soal ini dan pastikan apakah kunci jawabannya sudah benar.";

/// Context for the free-form strategy chat.
pub const STRATEGY_CONTEXT: &str = "Konteks: Diskusi Profesional Ahli Strategi";

/// Persona plus any per-call context.
#[must_use]
pub fn system_instruction(context: Option<&str>) -> String {
    match context.map(str::trim).filter(|ctx| !ctx.is_empty()) {
        Some(ctx) => format!("{PERSONA}\n\n{ctx}"),
        None => PERSONA.to_string(),
    }
}

fn lettered_options(question: &Question, separator: &str) -> String {
    question.lettered_options().join(separator)
}

fn answer_key(question: &Question) -> String {
    format!(
        "{}. {}",
        option_letter(question.correct_answer()),
        question.correct_option().unwrap_or_default()
    )
}

#[must_use]
pub fn question_batch(subject: Subject, count: usize, hots: bool) -> String {
    let difficulty = if hots {
        "\nSemua soal WAJIB bertipe HOTS (Higher Order Thinking Skills): analitis, multi-langkah, bukan hafalan.\n"
    } else {
        ""
    };
    format!(
        r#"
Generate {count} soal SNBT berkualitas tinggi untuk subtest: {subject}
{difficulty}
RETURN HANYA JSON ARRAY:
[
  {{
    "text": "question text",
    "options": ["A", "B", "C", "D", "E"],
    "correctAnswer": 0-4,
    "explanation": "explanation text",
    "quickTrick": "trick text"
  }}
]

PENTING: Pada bagian "text" atau "explanation", JANGAN GUNAKAN TANDA DOLAR ($) untuk rumus matematika. Gunakan simbol biasa seperti x², √, π, ≠, ≥, ≤.
"#,
        subject = subject.name()
    )
}

#[must_use]
pub fn deep_analysis(question: &Question) -> String {
    format!(
        r#"
Analisis soal SNBT berikut:

Soal: {text}

Opsi:
{options}

Jawaban Benar: {key}

Berikan analisis dalam 4 format berbeda (quick, simple, complex, interactive).
WAJIB MENGGUNAKAN SIMBOL UNICODE STANDAR (x², √, π) DAN TIDAK BOLEH MENGGUNAKAN TANDA DOLAR ($) ATAU BACKSLASH (\).

RETURN HANYA JSON:
{{
  "quick": "string",
  "simple": "string",
  "complex": "string",
  "interactive": "string"
}}
"#,
        text = question.text(),
        options = lettered_options(question, "\n"),
        key = answer_key(question),
    )
}

#[must_use]
pub fn topic_explanation(topic: &str, subject: Subject) -> String {
    format!(
        r#"
Analisis mendalam materi SNBT berikut:
Topik: {topic}
Subtest: {subject}

Berikan analisis dalam 4 format:
1. QUICK: Tips cepat dan strategi praktis (3-4 poin singkat)
2. SIMPLE: Analogi sederhana dengan contoh dunia nyata
3. COMPLEX: Penjelasan akademik mendalam. GUNAKAN SIMBOL UNICODE (x², √, π), JANGAN PAKAI $ atau \.
4. INTERACTIVE: 2-3 pertanyaan reflektif untuk siswa

Plus 1 contoh soal HOTS lengkap dengan jawaban dan step-by-step solution.

PENTING:
- Tulis rumus dengan simbol biasa: x², √, π, ≠, ≥, ≤.
- JANGAN gunakan tanda dolar $.
- JANGAN gunakan backslash \.
- Gunakan \n\n untuk paragraf baru
- Bahasa Indonesia yang jelas

RETURN HANYA JSON dengan format:
{{
  "quick": "string",
  "simple": "string",
  "complex": "string",
  "interactive": "string",
  "example": {{
    "question": "string",
    "answer": "string",
    "stepByStep": "string"
  }}
}}
"#,
        subject = subject.name()
    )
}

/// Context for the first tutor reply about the question on screen.
#[must_use]
pub fn walkthrough_context(question: &Question) -> String {
    format!(
        r#"Tugas: Analisis soal di bawah ini secara mendalam. Berikan jawaban yang benar berdasarkan logika matematika.

--- PERINTAH KHUSUS ---
JAWAB SINGKAT. MAKSIMAL 3 KALIMAT. Jangan bertele-tele.
JAWABLAH DENGAN BAHASA INDONESIA BIASA.
DILARANG KERAS MENGGUNAKAN TANDA DOLAR ($), KURUNG KURAWAL, Tanda BINTANG (*) atau BACKSLASH (\).
TULIS RUMUS MENGGUNAKAN HURUF BIASA DAN SIMBOL UNICODE (Contoh: U1, x², √, 10%, ≠).

--- DATA SOAL ---
Soal: {text}

Pilihan Jawaban:
{options}

Kunci Jawaban (Data Sistem): Pilihan {key}

--- INSTRUKSI ---
1. Jika perhitungan matematis menghasilkan angka yang BERBEDA dengan kunci jawaban sistem, jelaskan tuntas mengapa terjadi perbedaan (kemungkinan soal typo atau kunci salah).
2. Gunakan bahasa Indonesia yang santai namun profesional.
3. Jelaskan urutan dengan kata-kata (misal: "A duduk di sebelah kanan B"), jangan pakai notasi matematika.
4. Jawab langsung pertanyaan pengguna."#,
        text = question.text(),
        options = lettered_options(question, "\n"),
        key = answer_key(question),
    )
}

/// Context for follow-up questions in the same discussion.
#[must_use]
pub fn followup_context(question: &Question) -> String {
    format!(
        r"--- PERINTAH KHUSUS UNTUK JAWABAN INI ---
1. JANGAN GUNAKAN TANDA DOLAR ($) atau KURUNG KURAWAL MATEMATIKA atau BACKSLASH (\).
2. Tulis semua rumus dan variabel dalam bentuk teks biasa atau Unicode (misal: x², √, U1, U2, 10%).
3. Jelaskan dengan bahasa Indonesia yang jelas dan mudah dimengerti.
4. Jawab SINGKAT dan PADAT.

Soal: {text}
Pilihan:
{options}

Kunci Jawaban (Sistem): {key}

Catatan: Jika perhitungan matematis AI berbeda dengan kunci jawaban sistem, jelaskan perbedaannya.",
        text = question.text(),
        options = lettered_options(question, "\n"),
        key = question.correct_option().unwrap_or_default(),
    )
}
