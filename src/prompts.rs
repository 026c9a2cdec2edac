use crate::report::ReportPayload;

pub const MATCH_FUNCTION_NAME: &str = "get_matching_mdnos";

pub const MATCH_FUNCTION_DESCRIPTION: &str =
    "OCR로 읽은 약품명마다 DB 약품 목록에서 가장 일치하는 약품의 mdno를 같은 순서로 반환합니다.";

pub const MATCH_PARAM_DESCRIPTION: &str =
    "DB 약품의 mdno 목록. 길이와 순서가 OCR 약품명 목록과 같아야 합니다.";

pub const MATCH_SYSTEM: &str = "\
당신은 약품 데이터를 대조하는 약사입니다.
사용자는 처방전이나 약봉투를 OCR로 읽은 약품명 목록과, mdno가 포함된 DB 약품 목록을 줍니다.
OCR 약품명은 뒷부분이 잘리거나('···') 용량 숫자가 붙어 있을 수 있습니다.
각 OCR 약품명에 가장 가까운 DB 약품을 골라 그 mdno를 OCR 목록과 같은 순서로 돌려주세요.
결과는 반드시 get_matching_mdnos 함수 호출로만 반환합니다.";

pub const CATEGORY_SYSTEM: &str = "\
당신은 약사입니다.
사용자가 약효 분류 목록을 줍니다. (예: [\"해열제\", \"콧물약\"])
목록 전체를 대표하는 질병명 또는 약 카테고리 하나를 한국어로 답하세요. (예: 감기약)
카테고리명 외에는 설명, 문장, 따옴표, 문장 부호를 붙이지 마세요.";

pub const DESCRIPTION_SYSTEM: &str = "\
당신은 환자에게 친절하게 설명하는 약사입니다.
주어진 약품 정보, 약품 설명, 병용 주의사항을 엮어 환자가 이해하기 쉬운 복약 안내 문장을 만들어 주세요.
(예: 이 약은 ...에 쓰이며, ...와 함께 드시면 ...할 수 있으니 주의하세요.)
안내 문구(한국어)만 답하고 인사말이나 다른 설명은 붙이지 마세요.";

pub const REPORT_SYSTEM: &str = "\
당신은 환자의 복약 기록을 정리해 주는 약사입니다.
주어진 복약 기간, 복약 순응도, 주차별 부작용 기록을 바탕으로 환자에게 전하는 총평을 3~4문장으로 작성하세요.
잘한 점을 먼저 짚고, 부작용이 반복되면 의사나 약사와 상담하도록 권해 주세요.
총평(한국어)만 답하고 제목이나 목록 기호는 쓰지 마세요.";

pub fn match_user(ocr_names: &str, db_meds: &str) -> String {
    format!("OCR 약품명 목록: {ocr_names}\nDB 약품 목록: {db_meds}")
}

pub fn category_user(classifications: &str) -> String {
    format!("약효 분류 목록: {classifications}")
}

pub fn description_user(med_info: &str, med_desc: &str, warnings: &str) -> String {
    format!("- 약품 정보: {med_info}\n- 약품 설명: {med_desc}\n- 병용 주의사항: {warnings}")
}

pub fn report_user(report: &ReportPayload) -> String {
    let text = |value: &Option<String>| value.clone().unwrap_or_else(|| "알 수 없음".to_string());
    let count = |value: Option<u32>| value.unwrap_or(0);

    format!(
        "- 병원: {hospital}\n\
         - 약 분류: {category}\n\
         - 하루 복용 횟수: {taken}회\n\
         - 복약 기간: {start} ~ {end}\n\
         - 계획된 복용 횟수: {total}회 (현재까지 {current}회 예정)\n\
         - 기록된 복용 횟수: {saved}회\n\
         - 복약 순응도: {rate}%\n\
         - 주차별 부작용:\n{effects}",
        hospital = text(&report.hospital),
        category = text(&report.category),
        taken = count(report.taken),
        start = text(&report.start_date),
        end = text(&report.end_date),
        total = count(report.total_cycle),
        current = count(report.cur_cycle),
        saved = count(report.save_cycle),
        rate = report.adherence_rate(),
        effects = report.weekly_effects(),
    )
}
